use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use utw_core::{Config, TemperatureUnit};
use utw_screen::{AppState, AsyncLookups, DisplayOptions, ScreenController, TerminalView};
use utw_weather::{Geocoder, LocationProvider, WeatherProvider};

/// Current weather for where you are
#[derive(Debug, Parser)]
#[command(name = "under-the-weather", version, about)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use this latitude instead of looking up the location
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Use this longitude instead of looking up the location
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Temperature unit: auto, celsius or fahrenheit
    #[arg(long)]
    unit: Option<TemperatureUnit>,

    /// Run a single cycle and exit instead of waiting for commands
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    utw_core::init()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_at(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config.ensure_valid()?;

    let timeout = Duration::from_secs(config.network.timeout_secs);
    let location = LocationProvider::from_config(&config.location, timeout)?;
    let weather = WeatherProvider::new(
        &config.weather.base_url,
        config.weather.temperature_unit,
        timeout,
    )?;
    let geocoder = Geocoder::new(&config.geocode.base_url, &config.geocode.user_agent, timeout)?;

    let (lookups, mut messages) =
        AsyncLookups::new(location, weather, geocoder, tokio::runtime::Handle::current());
    let view = TerminalView::new(std::io::stdout());
    let mut controller = ScreenController::new(lookups, view, DisplayOptions::from(&config.ui));

    tracing::info!("Under The Weather started");
    controller.on_screen_activated();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = !cli.once;

    loop {
        tokio::select! {
            Some(message) = messages.recv() => {
                controller.handle_message(message);
                if controller.state().is_cycle_end() && !stdin_open {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(input)) => match input.trim() {
                        "r" | "R" => controller.on_retry_requested(),
                        "q" | "Q" => break,
                        "" => {}
                        other => tracing::debug!("Unknown command {:?}", other),
                    },
                    Ok(None) => {
                        tracing::debug!("stdin closed");
                        stdin_open = false;
                        if controller.state().is_cycle_end() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                        if controller.state().is_cycle_end() {
                            break;
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
            else => break,
        }
    }

    tracing::info!("Shutting down");

    if cli.once && controller.state() == AppState::Error {
        anyhow::bail!(
            "{}",
            controller.error_message().unwrap_or("Weather lookup failed")
        );
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        config.set_fixed_location(lat, lon);
    }
    if let Some(unit) = cli.unit {
        config.weather.temperature_unit = unit;
    }
}
