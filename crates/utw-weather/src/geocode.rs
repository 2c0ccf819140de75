//! Reverse geocoding: convert coordinates to a human-readable place name.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use crate::types::{Coordinates, GeocodeError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;
use utw_core::ReqwestErrorExt;

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// Most specific place, suffixed with the country when it adds information.
    fn place_name(self) -> Option<String> {
        let country = self.country.filter(|c| !c.trim().is_empty());

        let place = [
            self.city,
            self.town,
            self.village,
            self.municipality,
            self.county,
            self.state,
        ]
        .into_iter()
        .flatten()
        .find(|p| !p.trim().is_empty());

        match (place, country) {
            (Some(place), Some(country)) if place != country => {
                Some(format!("{}, {}", place, country))
            }
            (Some(place), _) => Some(place),
            (None, country) => country,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| GeocodeError::Network(e.into_network_error()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Reverse geocode coordinates to a place name such as "Cape Town, South Africa".
    #[instrument(skip(self), level = "info")]
    pub async fn reverse(&self, coordinates: &Coordinates) -> Result<String, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await
            .map_err(|e| GeocodeError::Network(e.into_network_error()))?;

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return Err(GeocodeError::Api(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Network(e.into_network_error()))?;

        let name = parse_place_name(&body)?;
        tracing::info!("Reverse geocoded to: {}", name);
        Ok(name)
    }
}

fn parse_place_name(body: &str) -> Result<String, GeocodeError> {
    let parsed: NominatimResponse =
        serde_json::from_str(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

    if let Some(error) = parsed.error {
        // Nominatim answers 200 with {"error": "Unable to geocode"} over open sea
        tracing::debug!("Reverse geocode error body: {}", error);
        return Err(GeocodeError::NoResult);
    }

    parsed
        .address
        .and_then(NominatimAddress::place_name)
        .ok_or(GeocodeError::NoResult)
}
