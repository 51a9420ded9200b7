//! External resource providers.
//!
//! # Data Flow
//! ```text
//! AppConfig.<resource>_url
//!     → empty        → Resource::Disabled (info log, no hook)
//!     → unparsable   → provider error (start aborts)
//!     → valid        → Resource::Enabled(handle) + one release hook
//! ```
//!
//! # Design Decisions
//! - Short timeouts and small pool ceilings: instances live for one request
//! - No connection is dialed during start; the first use dials, bounded by timeouts
//! - Handlers decide what a disabled resource means for them

pub mod cache;
pub mod database;

pub use cache::{Cache, CachePool};
pub use database::Database;

/// Outcome of a resource provider.
#[derive(Debug, Clone)]
pub enum Resource<T> {
    /// Not configured. Not an error.
    Disabled,
    /// Live handle; a release hook was registered alongside it.
    Enabled(T),
}

impl<T> Resource<T> {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Resource::Enabled(_))
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Resource::Enabled(handle) => Some(handle),
            Resource::Disabled => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Resource::Enabled(handle) => Some(handle),
            Resource::Disabled => None,
        }
    }
}

/// Whether a connection string counts as "not configured".
pub(crate) fn is_unset(url: &str) -> bool {
    url.trim().is_empty()
}
