use at_africastalking::{AfricasTalkingConfig, ConfigError as ProviderConfigError};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;

/// Errors raised while loading or validating [`AppConfig`]
#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("africastalking: {0}")]
    Provider(#[from] ProviderConfigError),
    #[error("invalid config field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Webhook server configuration
    pub server: ServerConfig,
    /// Gateway account and endpoints
    pub africastalking: AfricasTalkingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
    /// Path the gateway posts incoming messages to (default: /africastalking)
    pub web_path: String,
    /// Health check path (default: /health)
    pub health_path: String,
}

/// Log output format
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (default: info); `RUST_LOG` wins when set
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            web_path: "/africastalking".to_string(),
            health_path: "/health".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, AppConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // e.g. AT_TRANSPORT__AFRICASTALKING__API_KEY
            .add_source(Environment::with_prefix("AT_TRANSPORT").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an in-memory TOML document layered over the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, AppConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppConfigError> {
        self.africastalking.validate()?;
        if self.server.web_path.trim_matches('/').is_empty() {
            return Err(AppConfigError::InvalidField {
                field: "server.web_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.server.web_path.trim_matches('/') == self.server.health_path.trim_matches('/') {
            return Err(AppConfigError::InvalidField {
                field: "server.health_path",
                reason: "must differ from server.web_path".to_string(),
            });
        }
        Ok(())
    }
}
