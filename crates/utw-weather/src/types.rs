use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

pub use utw_core::{GeocodeError, LocationError, TemperatureUnit, WeatherError};

/// Validated latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(LocationError::InvalidCoordinates {
                lat: latitude,
                lon: longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Short "lat, lon" label used when no place name is known.
    pub fn display_short(&self) -> String {
        format!("{:.2}, {:.2}", self.latitude, self.longitude)
    }
}

/// Which provider produced a location fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    System,
    Ip,
    Fixed,
}

/// A one-shot location fix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub coordinates: Coordinates,
    pub accuracy_meters: Option<f64>,
    pub source: LocationSource,
}

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert a WMO weather interpretation code.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 | 66 | 67 => Self::Sleet, // freezing drizzle / rain
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::Sleet => "Sleet",
            Self::Thunderstorm => "Thunderstorm",
        }
    }

    /// Icon identifier; clear and partly cloudy skies differ between day and night.
    pub fn icon_name(&self, is_day: bool) -> &'static str {
        match (self, is_day) {
            (Self::Clear, true) => "sun",
            (Self::Clear, false) => "moon",
            (Self::PartlyCloudy, true) => "cloud_sun",
            (Self::PartlyCloudy, false) => "cloud_moon",
            (Self::Cloudy, _) => "cloud",
            (Self::Fog, _) => "cloud_fog",
            (Self::Drizzle | Self::Rain | Self::HeavyRain, _) => "cloud_rain",
            (Self::Snow | Self::Sleet, _) => "cloud_snow",
            (Self::Thunderstorm, _) => "cloud_lightning",
        }
    }
}

/// Current conditions at a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub unit: TemperatureUnit,
    pub condition: WeatherCondition,
    pub is_day: bool,
    pub observed_at: DateTime<Utc>,
    /// Offset of the observed location from UTC
    pub utc_offset_seconds: i32,
}

impl CurrentWeather {
    pub fn description(&self) -> &'static str {
        self.condition.description()
    }

    pub fn icon_name(&self) -> &'static str {
        self.condition.icon_name(self.is_day)
    }

    /// Observation time in the observed location's local time.
    pub fn local_observed_at(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| Utc.fix());
        self.observed_at.with_timezone(&offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(10.0, 20.0).is_ok());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
        assert!(Coordinates::new(90.5, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_coordinates_display_short() {
        let c = Coordinates::new(-33.9249, 18.4241).unwrap();
        assert_eq!(c.display_short(), "-33.92, 18.42");
    }

    #[test]
    fn test_wmo_codes_by_group() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(3), WeatherCondition::Cloudy);
        assert_eq!(WeatherCondition::from_wmo_code(48), WeatherCondition::Fog);
        assert_eq!(WeatherCondition::from_wmo_code(57), WeatherCondition::Sleet);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(86), WeatherCondition::Snow);
        assert_eq!(WeatherCondition::from_wmo_code(99), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_unknown_wmo_code_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(42), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_icon_depends_on_daylight() {
        assert_eq!(WeatherCondition::Clear.icon_name(true), "sun");
        assert_eq!(WeatherCondition::Clear.icon_name(false), "moon");
        assert_eq!(WeatherCondition::Rain.icon_name(false), "cloud_rain");
    }

    #[test]
    fn test_local_observed_at_applies_offset() {
        let weather = CurrentWeather {
            temperature: 22.0,
            unit: TemperatureUnit::Celsius,
            condition: WeatherCondition::Cloudy,
            is_day: true,
            observed_at: Utc.with_ymd_and_hms(2017, 5, 29, 22, 30, 0).unwrap(),
            utc_offset_seconds: 2 * 3600,
        };
        let local = weather.local_observed_at();
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2017-05-30 00:30");
        assert_eq!(weather.description(), "Cloudy");
        assert_eq!(weather.icon_name(), "cloud");
    }
}
