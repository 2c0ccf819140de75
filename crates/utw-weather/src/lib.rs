//! Weather lookups for Under The Weather
//!
//! Device location (platform service, IP geolocation, or fixed), current
//! conditions via Open-Meteo, and reverse geocoding via Nominatim.

pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;

pub use geocode::Geocoder;
pub use location::{IpLocator, LocationProvider};
pub use provider::WeatherProvider;
pub use types::*;
