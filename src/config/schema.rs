//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Service name used when `app_name` / `inngest_app_id` are not set.
pub const DEFAULT_APP_NAME: &str = "ephemeral-app";

/// Port used by the local run mode when `app_port` is not set.
pub const DEFAULT_APP_PORT: u16 = 3010;

/// Root configuration for one composition root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Informational service name.
    pub app_name: String,

    /// Informational environment name ("development", "production", ...).
    pub app_env: String,

    /// Listen port for the local (non-serverless) run mode.
    pub app_port: u16,

    /// Structured-logger verbosity.
    pub log_level: String,

    /// Redis connection string. Empty disables the cache provider.
    pub redis_url: String,

    /// Postgres connection string. Empty disables the database provider.
    pub pg_url: String,

    /// Identifies this deployment to the job-scheduling integration.
    pub inngest_app_id: String,
}

impl AppConfig {
    /// Whether the structured logger should emit JSON.
    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            app_env: "development".to_string(),
            app_port: DEFAULT_APP_PORT,
            log_level: "info".to_string(),
            redis_url: String::new(),
            pg_url: String::new(),
            inngest_app_id: DEFAULT_APP_NAME.to_string(),
        }
    }
}
