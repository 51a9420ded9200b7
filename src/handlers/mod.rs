//! Request handlers.
//!
//! Each handler implements [`crate::routing::RouteHandler`] and joins a
//! composition root through `as_route`; the jobs endpoint can also be
//! dispatched to directly by its own entrypoint.

pub mod health;
pub mod jobs;

pub use health::HealthHandler;
pub use jobs::{JobFunction, JobsEndpoint, JOBS_PATH};
