//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Declaration:
//!     as_route(ctor) → container group Group<Arc<dyn RouteHandler>>
//!
//! Router construction (aggregator.rs, once per composition root):
//!     Group members, declaration order
//!     → handler.rs: each member registers (method, path) pairs
//!     → table.rs: first registrant wins on exact collisions
//!     → middleware.rs: request id → trace → client ip → panic recovery → heartbeat
//!     → Freeze as immutable axum::Router
//! ```
//!
//! # Design Decisions
//! - The aggregator only knows the two-capability RouteHandler contract
//! - Deterministic precedence: earlier declaration wins, later is superseded silently
//! - A panic while serving becomes a 500 envelope; a panic while registering aborts start

pub mod aggregator;
pub mod handler;
pub mod middleware;
pub mod table;

pub use aggregator::{build_router, provide_router, Handlers, HEARTBEAT_PATH};
pub use handler::{as_route, RouteHandler, Routes};
pub use middleware::ClientIp;
pub use table::RouteTable;
