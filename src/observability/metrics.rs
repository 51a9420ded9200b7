//! Lifecycle and entrypoint metrics.
//!
//! # Metrics
//! - `lifecycle_start_total` (counter): start attempts by outcome
//! - `lifecycle_start_duration_seconds` (histogram): time spent starting
//! - `lifecycle_stop_hook_failures_total` (counter): failed or timed-out stop hooks
//! - `entrypoint_requests_total` (counter): requests by entrypoint and status

use std::time::Duration;

use axum::http::StatusCode;

pub fn record_start(outcome: &'static str, elapsed: Duration) {
    ::metrics::counter!("lifecycle_start_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("lifecycle_start_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_stop_hook_failure(hook: &str) {
    ::metrics::counter!("lifecycle_stop_hook_failures_total", "hook" => hook.to_string())
        .increment(1);
}

pub fn record_request(entrypoint: &'static str, status: StatusCode) {
    ::metrics::counter!(
        "entrypoint_requests_total",
        "entrypoint" => entrypoint,
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}
