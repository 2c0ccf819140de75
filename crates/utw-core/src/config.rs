use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

const APP_DIR_NAME: &str = "under-the-weather";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Joins all errors into one line for logging or bailing out.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub geocode: GeocodeConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Auto,
    Celsius,
    Fahrenheit,
}

/// Regions that report temperatures in Fahrenheit.
const FAHRENHEIT_REGIONS: &[&str] = &["US", "LR", "MM", "BS", "KY", "PW"];

impl TemperatureUnit {
    /// Resolve `Auto` against a POSIX locale string such as `en_US.UTF-8`.
    /// Concrete units are returned unchanged.
    pub fn resolve(self, locale: Option<&str>) -> TemperatureUnit {
        match self {
            TemperatureUnit::Auto => {
                let region = locale
                    .and_then(|l| l.split(['.', '@']).next())
                    .and_then(|l| l.split_once('_'))
                    .map(|(_, region)| region);
                match region {
                    Some(r) if FAHRENHEIT_REGIONS.contains(&r) => TemperatureUnit::Fahrenheit,
                    _ => TemperatureUnit::Celsius,
                }
            }
            unit => unit,
        }
    }

    /// Resolve `Auto` using the process locale (`LC_ALL`, `LC_MEASUREMENT`, `LANG`).
    pub fn resolve_from_env(self) -> TemperatureUnit {
        let locale = ["LC_ALL", "LC_MEASUREMENT", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.is_empty());
        self.resolve(locale.as_deref())
    }

    /// Unit name as understood by the weather API.
    pub fn api_name(self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Auto | TemperatureUnit::Celsius => "celsius",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Auto | TemperatureUnit::Celsius => "°C",
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(TemperatureUnit::Auto),
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            other => Err(format!("unknown temperature unit: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Temperature unit preference
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,

    /// Base URL of the Open-Meteo compatible forecast API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Auto,
            base_url: default_weather_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    /// Base URL of the Nominatim compatible reverse geocoding API
    #[serde(default = "default_geocode_base_url")]
    pub base_url: String,

    /// Nominatim's usage policy requires an identifying User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geocode_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    format!("UnderTheWeather/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocode_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Where device coordinates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationSourceKind {
    /// Platform location service (GeoClue2 on Linux, Geolocator on Windows)
    System,
    /// Approximate location from the public IP address
    #[default]
    Ip,
    /// Coordinates from this file or the command line
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub source: LocationSourceKind,

    #[serde(default = "default_ip_api_url")]
    pub ip_api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

fn default_ip_api_url() -> String {
    "https://ipapi.co/json/".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            source: LocationSourceKind::Ip,
            ip_api_url: default_ip_api_url(),
            latitude: None,
            longitude: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout for every lookup
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// chrono format string for the date label
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Animate panel transitions after the first render
    #[serde(default = "default_animations")]
    pub animations: bool,
}

fn default_date_format() -> String {
    "%A, %-d %B %Y".to_string()
}

fn default_animations() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            animations: default_animations(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load from `path`, or from the default location when `None`
    pub fn load_at(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::load(),
        }
    }

    /// Pin the location source to the given coordinates.
    ///
    /// Range checks happen in `validate()`, so call this before validating.
    pub fn set_fixed_location(&mut self, latitude: f64, longitude: f64) {
        self.location.source = LocationSourceKind::Fixed;
        self.location.latitude = Some(latitude);
        self.location.longitude = Some(longitude);
    }

    /// Validate, failing on errors and logging warnings
    pub fn ensure_valid(&self) -> Result<ValidationResult> {
        let validation = self.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        validate_url(&self.geocode.base_url, "geocode.base_url", &mut result);
        validate_url(&self.location.ip_api_url, "location.ip_api_url", &mut result);

        if self.geocode.user_agent.trim().is_empty() {
            result.add_warning(
                "geocode.user_agent",
                "Empty User-Agent; the geocoding service may reject requests",
            );
        }

        if self.network.timeout_secs == 0 {
            result.add_error("network.timeout_secs", "Timeout must be greater than 0");
        } else if self.network.timeout_secs > 120 {
            result.add_warning(
                "network.timeout_secs",
                "Timeout is unusually long (>120 seconds)",
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", "Latitude must be within -90..=90");
                }
                if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
                    result.add_error("location.longitude", "Longitude must be within -180..=180");
                }
            }
            (None, None) => {
                if self.location.source == LocationSourceKind::Fixed {
                    result.add_error(
                        "location",
                        "Fixed location source requires latitude and longitude",
                    );
                }
            }
            _ => {
                result.add_error(
                    "location",
                    "Latitude and longitude must be set together",
                );
            }
        }

        if self.ui.date_format.trim().is_empty() {
            result.add_warning("ui.date_format", "Empty date format; the date label will be blank");
        }

        result
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path to the configuration file in the user's config directory
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.base_url = "ftp://example.com".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_timeout_is_error() {
        let mut config = Config::default();
        config.network.timeout_secs = 0;
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "network.timeout_secs"));
    }

    #[test]
    fn test_fixed_source_requires_coordinates() {
        let mut config = Config::default();
        config.location.source = LocationSourceKind::Fixed;
        assert!(!config.validate().is_valid());

        config.location.latitude = Some(-33.92);
        config.location.longitude = Some(18.42);
        assert!(config.validate().is_valid());
    }

    #[test]
    fn test_out_of_range_latitude() {
        let mut config = Config::default();
        config.location.latitude = Some(91.0);
        config.location.longitude = Some(0.0);
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "location.latitude"));
    }

    #[test]
    fn test_auto_unit_resolves_by_region() {
        let auto = TemperatureUnit::Auto;
        assert_eq!(auto.resolve(Some("en_US.UTF-8")), TemperatureUnit::Fahrenheit);
        assert_eq!(auto.resolve(Some("en_ZA.UTF-8")), TemperatureUnit::Celsius);
        assert_eq!(auto.resolve(Some("C")), TemperatureUnit::Celsius);
        assert_eq!(auto.resolve(None), TemperatureUnit::Celsius);
        assert_eq!(
            TemperatureUnit::Celsius.resolve(Some("en_US")),
            TemperatureUnit::Celsius
        );
    }

    #[test]
    fn test_unit_from_str() {
        assert_eq!("F".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!("celsius".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Celsius));
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
    }

    #[test]
    fn test_load_from_missing_path_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.network.timeout_secs, 10);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.weather.base_url, config.weather.base_url);
        assert_eq!(reloaded.location.source, LocationSourceKind::Ip);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[location]\nsource = \"fixed\"\nlatitude = 10.0\nlongitude = 20.0\n\n[weather]\ntemperature_unit = \"fahrenheit\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.location.source, LocationSourceKind::Fixed);
        assert_eq!(config.location.latitude, Some(10.0));
        assert_eq!(config.weather.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com");
        assert!(config.ui.animations);
    }

    #[test]
    fn test_fixed_source_without_coordinates_accepts_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[location]\nsource = \"fixed\"\n").unwrap();

        let mut config = Config::load_at(Some(&path)).unwrap();
        assert!(config.ensure_valid().is_err());

        config.set_fixed_location(10.0, 20.0);
        assert!(config.ensure_valid().is_ok());
        assert_eq!(config.location.latitude, Some(10.0));
    }

    #[test]
    fn test_override_replaces_bad_file_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[location]\nsource = \"ip\"\nlatitude = 95.0\nlongitude = 20.0\n",
        )
        .unwrap();

        let mut config = Config::load_at(Some(&path)).unwrap();
        assert!(config.ensure_valid().is_err());

        config.set_fixed_location(-33.92, 18.42);
        assert_eq!(config.location.source, LocationSourceKind::Fixed);
        assert!(config.ensure_valid().is_ok());
    }

    #[test]
    fn test_out_of_range_override_is_rejected() {
        let mut config = Config::default();
        config.set_fixed_location(10.0, 200.0);
        let err = config.ensure_valid().unwrap_err();
        assert!(err.to_string().contains("location.longitude"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[network\ntimeout_secs = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
