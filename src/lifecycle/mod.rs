//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (manager.rs):
//!     Container → resolution plan → providers run in dependency order
//!     (each may append a Hook) → start hooks in registration order
//!     all bounded by the start Deadline
//!
//! Stop (manager.rs / hooks.rs):
//!     stop hooks in reverse registration order, bounded by the stop Deadline
//!     failures collected, never short-circuited
//! ```
//!
//! # State Machine
//! ```text
//! Declared → Starting → Running → Stopping → Stopped
//!               └──→ Failed ──(cleanup)──→ Stopped
//! ```
//!
//! # Design Decisions
//! - Hooks are owned by one App instance; there is no process-wide registry
//! - Start and stop have independent budgets
//! - A failed start still tears down whatever was constructed before the failure

pub mod error;
pub mod hooks;
pub mod manager;

pub use error::{BoxError, HookFailure, StartError, StopError, START_TIMED_OUT, STARTUP_FAILED};
pub use hooks::{Deadline, Hook, Lifecycle};
pub use manager::{App, State, DEFAULT_START_TIMEOUT, DEFAULT_STOP_TIMEOUT};
