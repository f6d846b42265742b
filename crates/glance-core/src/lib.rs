pub mod config;
pub mod error;

pub use config::{
    Config, DisplayConfig, HealthConfig, LocationConfig, LocationProviderKind, RefreshConfig,
    RefreshMode, ValidationResult, WeatherConfig,
};
pub use error::{ConfigError, NetworkError, ReqwestErrorExt};

use anyhow::Result;

/// Initialize logging for the application.
///
/// Logs go to stderr so stdout carries only the rendered snapshots.
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    tracing::info!("Glance core initialized");
    Ok(())
}
