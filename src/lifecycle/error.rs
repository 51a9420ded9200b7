//! Lifecycle error types.

use std::any::Any;
use std::fmt;
use std::time::Duration;

use crate::container::ContainerError;

/// Boxed error returned by providers, invocations and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reasons the start phase did not reach `Running`.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// The composition root is malformed (missing provider, cycle, ...).
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// A provider or invocation returned an error.
    #[error("{provider}: {source}")]
    Provider {
        provider: &'static str,
        #[source]
        source: BoxError,
    },

    /// A provider, invocation or start hook panicked.
    #[error("{component} panicked during start: {message}")]
    Panicked { component: String, message: String },

    /// A start hook returned an error.
    #[error("start hook {hook} failed: {source}")]
    StartHook {
        hook: String,
        #[source]
        source: BoxError,
    },

    /// The start budget elapsed before resolution completed.
    #[error("start timed out after {budget:?}")]
    Timeout { budget: Duration },

    /// `start` was called on an app that is not in the `Declared` state.
    #[error("app already started (state: {0:?})")]
    AlreadyStarted(crate::lifecycle::State),
}

/// Message shown to a caller whose request could not be started.
pub const STARTUP_FAILED: &str = "service unavailable: startup failed";

/// Message shown to a caller whose request ran out of start budget.
pub const START_TIMED_OUT: &str = "service unavailable: start timed out";

impl StartError {
    /// Caller-facing text. Details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            StartError::Timeout { .. } => START_TIMED_OUT,
            _ => STARTUP_FAILED,
        }
    }
}

/// One stop hook that did not complete cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub hook: String,
    pub message: String,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.hook, self.message)
    }
}

/// Aggregated teardown failures.
#[derive(Debug, thiserror::Error)]
pub enum StopError {
    /// Every hook ran; some of them failed.
    #[error("{} stop hook(s) failed: {}", .0.len(), join(.0))]
    Hooks(Vec<HookFailure>),

    /// The stop budget ran out before every hook could run.
    #[error("stop timed out after {budget:?}; {} hook(s) not run", .skipped.len())]
    Timeout {
        budget: Duration,
        failures: Vec<HookFailure>,
        skipped: Vec<String>,
    },
}

impl StopError {
    /// Hooks that ran and failed.
    pub fn failures(&self) -> &[HookFailure] {
        match self {
            StopError::Hooks(failures) => failures,
            StopError::Timeout { failures, .. } => failures,
        }
    }
}

fn join(failures: &[HookFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
