//! Per-request composition roots for serverless HTTP functions.
//!
//! Every request builds a fresh dependency graph, starts it within a
//! bounded budget, dispatches once, and tears it down again.

pub mod app;
pub mod config;
pub mod container;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resources;
pub mod routing;
pub mod scaffold;

pub use config::AppConfig;
pub use container::{BuildContext, Container, Group};
pub use http::{Dispatch, Entrypoint};
pub use lifecycle::{App, Hook, StartError, StopError};
pub use routing::{as_route, RouteHandler, Routes};
