pub mod config;
pub mod error;

pub use config::{
    Config, GeocodeConfig, LocationConfig, LocationSourceKind, NetworkConfig, TemperatureUnit,
    UiConfig, ValidationResult, WeatherConfig,
};
pub use error::{GeocodeError, LocationError, NetworkError, ReqwestErrorExt, WeatherError};

use anyhow::Result;

/// Initialize logging.
///
/// Logs go to stderr so they never interleave with the screen on stdout.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("Under The Weather core initialized");
    Ok(())
}
