//! Screen state machine states.
//!
//! Only `ScreenController` mutates the current state.

use std::fmt;

/// Progress through the lookup pipeline (location → weather → place name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Init,
    GettingLocation,
    GettingWeather,
    GettingCountryName,
    Idle,
    Error,
}

impl AppState {
    /// True while a lookup is in flight.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            AppState::GettingLocation | AppState::GettingWeather | AppState::GettingCountryName
        )
    }

    /// True for the states that end a cycle and accept a retry.
    pub fn is_cycle_end(self) -> bool {
        matches!(self, AppState::Idle | AppState::Error)
    }

    /// Caption shown on the loading panel.
    pub fn loading_caption(self) -> &'static str {
        match self {
            AppState::Init => "Starting…",
            AppState::GettingLocation => "Finding your location…",
            AppState::GettingWeather => "Fetching the weather…",
            AppState::GettingCountryName => "Looking up where you are…",
            AppState::Idle | AppState::Error => "",
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_getting_states_are_busy() {
        assert!(AppState::GettingLocation.is_busy());
        assert!(AppState::GettingWeather.is_busy());
        assert!(AppState::GettingCountryName.is_busy());
        assert!(!AppState::Init.is_busy());
        assert!(!AppState::Idle.is_busy());
    }

    #[test]
    fn test_only_idle_and_error_end_a_cycle() {
        assert!(AppState::Idle.is_cycle_end());
        assert!(AppState::Error.is_cycle_end());
        assert!(!AppState::Init.is_cycle_end());
        assert!(!AppState::GettingWeather.is_cycle_end());
    }

    #[test]
    fn test_default_is_init() {
        assert_eq!(AppState::default(), AppState::Init);
    }
}
