//! Current conditions from the Open-Meteo forecast API.

use crate::types::{Coordinates, CurrentWeather, TemperatureUnit, WeatherCondition, WeatherError};
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;
use utw_core::ReqwestErrorExt;

const CURRENT_FIELDS: &str = "temperature_2m,weather_code,is_day";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    current: Option<CurrentBlock>,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    time: i64,
    temperature_2m: Option<f64>,
    weather_code: Option<i32>,
    is_day: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    base_url: String,
    unit: TemperatureUnit,
}

impl WeatherProvider {
    /// `Auto` units are resolved against the process locale here.
    pub fn new(
        base_url: &str,
        unit: TemperatureUnit,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            unit: unit.resolve_from_env(),
        })
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Fetch current conditions for `coordinates`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_current(
        &self,
        coordinates: &Coordinates,
    ) -> Result<CurrentWeather, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("temperature_unit", self.unit.api_name().to_string()),
                ("timezone", "auto".to_string()),
                ("timeformat", "unixtime".to_string()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.reason)
                .unwrap_or(body);
            tracing::debug!("Weather API returned {}: {}", status, message);
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        self.parse_current(&body)
    }

    fn parse_current(&self, body: &str) -> Result<CurrentWeather, WeatherError> {
        let parsed: ForecastResponse =
            serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let current = parsed
            .current
            .ok_or_else(|| WeatherError::Parse("missing current block".into()))?;
        let temperature = current
            .temperature_2m
            .ok_or_else(|| WeatherError::Parse("missing temperature_2m".into()))?;
        let code = current
            .weather_code
            .ok_or_else(|| WeatherError::Parse("missing weather_code".into()))?;
        let observed_at = DateTime::from_timestamp(current.time, 0)
            .ok_or_else(|| WeatherError::Parse(format!("invalid time {}", current.time)))?;

        let weather = CurrentWeather {
            temperature,
            unit: self.unit,
            condition: WeatherCondition::from_wmo_code(code),
            is_day: current.is_day.map_or(true, |d| d != 0),
            observed_at,
            utc_offset_seconds: parsed.utc_offset_seconds,
        };

        tracing::info!(
            "Current weather: {:.1}{} {}",
            weather.temperature,
            weather.unit.symbol(),
            weather.description()
        );
        Ok(weather)
    }
}
