use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::errors::CoreError;

/// Console logging configuration for hosts embedding the core library.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub service_name: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "portfolio-tracker".to_string()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "portfolio-tracker".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Install a global `fmt` subscriber filtered by `config.log_level`.
///
/// Fails if the filter directive is invalid or a global subscriber is
/// already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), CoreError> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .map_err(|e| CoreError::Config(format!("Invalid log filter '{}': {e}", config.log_level)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| CoreError::Config(format!("Logging already initialised: {e}")))?;

    tracing::info!(service = %config.service_name, "logging initialised");
    Ok(())
}
