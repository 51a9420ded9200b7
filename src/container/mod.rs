//! Composition root subsystem.
//!
//! # Data Flow
//! ```text
//! Declaration (registry.rs):
//!     Container::new()
//!         .provide(f)        one provider per output type
//!         .provide_into(f)   member of Group<T>, declaration order kept
//!         .invoke(f)         side effect run during start
//!     → nothing is constructed yet
//!
//! Resolution (plan.rs):
//!     requested output type
//!     → depth-first topological walk over provider metadata (deps.rs keys)
//!     → ordered steps, cycles rejected before anything runs
//!     → steps executed one by one, each provider at most once
//! ```
//!
//! # Design Decisions
//! - Dependencies are declared as tuples of types, checked when resolved
//! - Handlers join a group by declaration, never through a central list
//! - Values are cloned out of the resolved set; handles (pools, routers) are cheap clones

pub mod deps;
pub mod plan;
pub mod registry;

pub use deps::{Dependencies, Group, Key, Resolved};
pub use registry::{BuildContext, Container};

/// Errors in the shape of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    #[error("missing provider for {type_name} (required by {required_by})")]
    MissingProvider {
        type_name: &'static str,
        required_by: &'static str,
    },

    #[error("duplicate provider for {0}")]
    DuplicateProvider(&'static str),

    #[error("dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<&'static str>),

    #[error("{0} requested before it was resolved")]
    Unresolved(&'static str),
}
