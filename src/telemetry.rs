use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

pub type TelemetryError = Box<dyn std::error::Error + Send + Sync>;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
}
