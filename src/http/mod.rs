//! HTTP glue subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (already accepted by the platform)
//!     → entrypoint.rs: fresh Container → App::start (bounded)
//!         → start failed: render.rs error envelope, no dispatch
//!         → started:      dispatch to the resolved router / handler
//!     → App::stop (bounded), always
//!     → response
//! ```
//!
//! # Design Decisions
//! - One composition root per request; nothing is reused across requests
//! - The lifecycle runs on its own task, so a dropped caller cannot skip teardown
//! - User-visible failures are always the JSON error envelope

pub mod entrypoint;
pub mod render;

pub use entrypoint::{Dispatch, Entrypoint};
pub use render::{ErrorResponse, UNKNOWN_ERROR};
