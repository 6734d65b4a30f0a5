//! Tracing subscriber initialization.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;
use crate::error::AppError;
use crate::result::AppResult;

/// Install the global tracing subscriber from configuration.
///
/// `RUST_LOG` overrides the configured level. Fails if a subscriber is
/// already installed, so call this once at startup.
pub fn init(config: &LoggingConfig) -> AppResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = match config.format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init(),
        _ => fmt().pretty().with_env_filter(filter).with_target(true).try_init(),
    };

    installed.map_err(|e| {
        AppError::configuration(format!("Failed to install tracing subscriber: {e}"))
    })
}
