//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! schema defaults (serde)
//!     → optional TOML file named by APP_CONFIG_FILE
//!     → process environment (REDIS_URL, PG_URL, ...)
//!     → explicit overrides (tests, embedders)
//!     → loader.rs (layer & deserialize)
//!     → AppConfig (immutable, one copy per composition root)
//! ```
//!
//! # Design Decisions
//! - Every key has a default, so an empty environment is a valid configuration
//! - Empty connection strings are not errors; they disable the matching resource
//! - The log level is not validated here; the logger falls back to `info`

pub mod loader;
pub mod schema;

pub use loader::{provide, ConfigError, ConfigLoader};
pub use schema::AppConfig;
