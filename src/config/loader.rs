//! Configuration loading from file, environment and overrides.

use std::path::PathBuf;

use crate::config::schema::AppConfig;
use crate::container::BuildContext;
use crate::lifecycle::BoxError;

/// Environment variable naming an optional TOML configuration file.
pub const CONFIG_FILE_ENV: &str = "APP_CONFIG_FILE";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to assemble configuration sources: {0}")]
    Build(#[source] ::config::ConfigError),

    #[error("failed to deserialize configuration: {0}")]
    Deserialize(#[source] ::config::ConfigError),
}

/// Layered configuration loader.
///
/// Sources are applied in order: schema defaults, the optional file, the
/// process environment, then explicit overrides. Later sources win.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    environment: bool,
    overrides: Vec<(String, String)>,
}

impl ConfigLoader {
    /// A loader that only yields schema defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader reading the process environment and `APP_CONFIG_FILE`.
    pub fn from_env() -> Self {
        Self {
            file: std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from),
            environment: true,
            overrides: Vec::new(),
        }
    }

    /// Read an additional TOML file. Missing files are ignored.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Force a key to a value, regardless of other sources.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Load and deserialize the configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = &self.file {
            builder = builder.add_source(
                ::config::File::from(path.as_path())
                    .format(::config::FileFormat::Toml)
                    .required(false),
            );
        }

        if self.environment {
            builder = builder.add_source(::config::Environment::default());
        }

        for (key, value) in &self.overrides {
            builder = builder
                .set_override(key.as_str(), value.as_str())
                .map_err(ConfigError::Build)?;
        }

        builder
            .build()
            .map_err(ConfigError::Build)?
            .try_deserialize()
            .map_err(ConfigError::Deserialize)
    }
}

/// Composition-root provider for [`AppConfig`], read from the environment.
pub async fn provide(_: (), _ctx: BuildContext) -> Result<AppConfig, BoxError> {
    let config = ConfigLoader::from_env().load()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_sources() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.app_port, 3010);
        assert_eq!(config.log_level, "info");
        assert!(config.redis_url.is_empty());
        assert!(config.pg_url.is_empty());
    }

    #[test]
    fn test_overrides_win() {
        let config = ConfigLoader::new()
            .set("redis_url", "redis://127.0.0.1:6379")
            .set("app_port", "8080")
            .load()
            .unwrap();
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.app_port, 8080);
        assert_eq!(config.app_env, "development");
    }

    #[test]
    fn test_file_source() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "app_env = \"production\"\ninngest_app_id = \"jobs\"").unwrap();

        let config = ConfigLoader::new().file(file.path()).load().unwrap();
        assert!(config.is_production());
        assert_eq!(config.inngest_app_id, "jobs");
        assert_eq!(config.app_name, "ephemeral-app");
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let config = ConfigLoader::new()
            .file("/definitely/not/here.toml")
            .load()
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let err = ConfigLoader::new().set("app_port", "not-a-port").load();
        assert!(matches!(err, Err(ConfigError::Deserialize(_))));
    }
}
