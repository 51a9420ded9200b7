//! Structured logging.

use tracing::level_filters::LevelFilter;
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::container::BuildContext;
use crate::lifecycle::BoxError;

/// Parse a configured level name, falling back to `info`.
///
/// Only the named levels are accepted; blanks and numeric levels fall back.
pub fn level_from(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Install the global subscriber. Later calls are no-ops.
///
/// `RUST_LOG` wins over `log_level` when it is set.
pub fn init(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level_from(&config.log_level).into()));

    let json = config.is_production();
    let result = tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .try_init();

    if result.is_ok() {
        tracing::debug!(level = %config.log_level, json, "logging initialized");
    }
}

/// Logger handed to providers and handlers of one composition root.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
    scope: Uuid,
}

impl Logger {
    pub fn new(config: &AppConfig) -> Self {
        let scope = Uuid::new_v4();
        let span = tracing::info_span!(
            "app",
            app = %config.app_name,
            env = %config.app_env,
            scope = %scope,
        );
        Self { span, scope }
    }

    /// Parent span for events logged on behalf of this root.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn scope_id(&self) -> Uuid {
        self.scope
    }
}

/// Composition-root provider for [`Logger`].
pub async fn provide((config,): (AppConfig,), _ctx: BuildContext) -> Result<Logger, BoxError> {
    init(&config);
    Ok(Logger::new(&config))
}
