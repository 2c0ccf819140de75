//! One-shot device location.
//!
//! `LocationProvider` hides where the fix comes from: the platform service,
//! an IP geolocation API, or coordinates the user configured.

#[cfg(target_os = "linux")]
mod geoclue;
#[cfg(windows)]
mod winrt;

use crate::types::{Coordinates, Location, LocationError, LocationSource};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;
use utw_core::{LocationConfig, LocationSourceKind, NetworkError, ReqwestErrorExt};

#[derive(Debug, Clone)]
pub enum LocationProvider {
    /// Platform location service
    System { timeout: Duration },
    /// IP geolocation
    Ip(IpLocator),
    /// User supplied coordinates
    Fixed(Coordinates),
}

impl LocationProvider {
    pub fn from_config(config: &LocationConfig, timeout: Duration) -> Result<Self, LocationError> {
        match config.source {
            LocationSourceKind::System => Ok(Self::System { timeout }),
            LocationSourceKind::Ip => Ok(Self::Ip(IpLocator::new(&config.ip_api_url, timeout)?)),
            LocationSourceKind::Fixed => match (config.latitude, config.longitude) {
                (Some(lat), Some(lon)) => Ok(Self::Fixed(Coordinates::new(lat, lon)?)),
                _ => Err(LocationError::Other(
                    "fixed location requires latitude and longitude".into(),
                )),
            },
        }
    }

    /// Request the current location once.
    pub async fn locate(&self) -> Result<Location, LocationError> {
        match self {
            Self::System { timeout } => system_location(*timeout).await,
            Self::Ip(locator) => locator.locate().await,
            Self::Fixed(coordinates) => Ok(Location {
                coordinates: *coordinates,
                accuracy_meters: None,
                source: LocationSource::Fixed,
            }),
        }
    }
}

#[cfg(target_os = "linux")]
async fn system_location(timeout: Duration) -> Result<Location, LocationError> {
    geoclue::locate(timeout).await
}

#[cfg(windows)]
async fn system_location(timeout: Duration) -> Result<Location, LocationError> {
    winrt::locate(timeout).await
}

#[cfg(not(any(target_os = "linux", windows)))]
async fn system_location(_timeout: Duration) -> Result<Location, LocationError> {
    Err(LocationError::ServiceUnavailable)
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Approximate location from an ipapi.co compatible endpoint.
#[derive(Debug, Clone)]
pub struct IpLocator {
    client: Client,
    url: String,
}

impl IpLocator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    #[instrument(skip(self), level = "info")]
    pub async fn locate(&self) -> Result<Location, LocationError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| network_to_location(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("IP geolocation returned status {}", status);
            return Err(status_to_location(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| network_to_location(e.into_network_error()))?;

        let parsed: IpApiResponse =
            serde_json::from_str(&body).map_err(|e| LocationError::Other(e.to_string()))?;

        if parsed.error {
            let reason = parsed.reason.unwrap_or_default();
            tracing::debug!("IP geolocation error: {}", reason);
            return Err(if reason.contains("RateLimited") {
                LocationError::ServiceUnavailable
            } else {
                LocationError::Other(reason)
            });
        }

        let (lat, lon) = parsed
            .latitude
            .zip(parsed.longitude)
            .ok_or_else(|| LocationError::Other("response has no coordinates".into()))?;

        let location = Location {
            coordinates: Coordinates::new(lat, lon)?,
            accuracy_meters: None,
            source: LocationSource::Ip,
        };
        tracing::info!("Located via IP: {}", location.coordinates.display_short());
        Ok(location)
    }
}

fn network_to_location(error: NetworkError) -> LocationError {
    match error {
        NetworkError::Timeout => LocationError::Timeout,
        NetworkError::ServerError { status, .. } => StatusCode::from_u16(status)
            .map(status_to_location)
            .unwrap_or(LocationError::ServiceUnavailable),
        NetworkError::InvalidResponse(msg) => LocationError::Other(msg),
        NetworkError::ConnectionFailed(_) => LocationError::ServiceUnavailable,
    }
}

fn status_to_location(status: StatusCode) -> LocationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LocationError::PermissionDenied,
        StatusCode::TOO_MANY_REQUESTS => LocationError::ServiceUnavailable,
        s if s.is_server_error() => LocationError::ServiceUnavailable,
        s => LocationError::Other(format!("unexpected status {}", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_provider_returns_configured_coordinates() {
        let config = LocationConfig {
            source: LocationSourceKind::Fixed,
            latitude: Some(10.0),
            longitude: Some(20.0),
            ..Default::default()
        };
        let provider = LocationProvider::from_config(&config, Duration::from_secs(1)).unwrap();
        let location = provider.locate().await.unwrap();
        assert_eq!(location.coordinates, Coordinates::new(10.0, 20.0).unwrap());
        assert_eq!(location.source, LocationSource::Fixed);
    }

    #[test]
    fn test_fixed_provider_without_coordinates_is_error() {
        let config = LocationConfig {
            source: LocationSourceKind::Fixed,
            ..Default::default()
        };
        assert!(LocationProvider::from_config(&config, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_to_location(StatusCode::FORBIDDEN),
            LocationError::PermissionDenied
        ));
        assert!(matches!(
            status_to_location(StatusCode::SERVICE_UNAVAILABLE),
            LocationError::ServiceUnavailable
        ));
        assert!(matches!(
            status_to_location(StatusCode::NOT_FOUND),
            LocationError::Other(_)
        ));
    }

    #[test]
    fn test_network_timeout_maps_to_timeout() {
        assert!(matches!(
            network_to_location(NetworkError::Timeout),
            LocationError::Timeout
        ));
        assert!(matches!(
            network_to_location(NetworkError::ConnectionFailed("refused".into())),
            LocationError::ServiceUnavailable
        ));
    }
}
