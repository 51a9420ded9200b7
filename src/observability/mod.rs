//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Composition root:
//!     AppConfig → logging.rs (global subscriber, once per process)
//!               → Logger (span tagged with app + scope id, one per root)
//!
//! Lifecycle / entrypoints:
//!     → metrics.rs (start outcomes, stop hook failures, requests)
//! ```
//!
//! # Design Decisions
//! - Structured logging via `tracing`; JSON in production, human-readable otherwise
//! - An unrecognized log level falls back to `info` instead of failing start
//! - Metrics go through the `metrics` facade; no exporter is installed here

pub mod logging;
pub mod metrics;

pub use logging::Logger;
