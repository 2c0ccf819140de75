//! Lookup failures as the screen sees them.
//!
//! The controller only distinguishes fatal from non-fatal; the variant picks
//! the message shown on the error panel.

use thiserror::Error;
use utw_core::{GeocodeError, LocationError, WeatherError};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Location unavailable: {0}")]
    LocationUnavailable(#[from] LocationError),

    #[error("Weather fetch failed: {0}")]
    WeatherFetchFailed(#[from] WeatherError),

    /// Non-fatal: the screen still reaches `Idle`.
    #[error("Place name fetch failed: {0}")]
    NameFetchFailed(#[from] GeocodeError),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl LookupError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LookupError::NameFetchFailed(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            LookupError::LocationUnavailable(e) => e.user_message().to_string(),
            LookupError::WeatherFetchFailed(e) => e.user_message().to_string(),
            LookupError::NameFetchFailed(e) => e.user_message().to_string(),
            LookupError::Unknown(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_name_fetch_is_non_fatal() {
        assert!(LookupError::from(LocationError::Timeout).is_fatal());
        assert!(LookupError::from(WeatherError::Parse("x".into())).is_fatal());
        assert!(LookupError::Unknown("x".into()).is_fatal());
        assert!(!LookupError::from(GeocodeError::NoResult).is_fatal());
    }

    #[test]
    fn test_permission_denied_message() {
        let err = LookupError::from(LocationError::PermissionDenied);
        assert!(err.user_message().to_lowercase().contains("permission"));
    }
}
