//! Screen controller: owns the state machine and the display data, drives
//! the lookup chain and renders after every transition.
//!
//! ```text
//! Init ─activate─▶ GettingLocation ─ok─▶ GettingWeather ─ok─▶ GettingCountryName ─▶ Idle
//!                        │                     │
//!                        └──────err────────────┴──────▶ Error
//! Idle / Error ─retry─▶ Init
//! ```
//!
//! A place name failure still ends in `Idle`; the location label then shows
//! the coordinates instead.

use utw_weather::{Coordinates, CurrentWeather, GeocodeError, Location, LocationError, WeatherError};

use crate::display::{DisplayData, DisplayOptions, ViewFrame};
use crate::error::LookupError;
use crate::lookups::{Lookups, ScreenMessage};
use crate::state::AppState;
use crate::view::ScreenView;

pub struct ScreenController<L, V> {
    state: AppState,
    display: DisplayData,
    coordinates: Option<Coordinates>,
    options: DisplayOptions,
    lookups: L,
    view: V,
}

impl<L: Lookups, V: ScreenView> ScreenController<L, V> {
    /// Created on screen load; nothing is rendered until activation.
    pub fn new(lookups: L, view: V, options: DisplayOptions) -> Self {
        Self {
            state: AppState::Init,
            display: DisplayData::default(),
            coordinates: None,
            options,
            lookups,
            view,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn display(&self) -> &DisplayData {
        &self.display
    }

    pub fn error_message(&self) -> Option<&str> {
        self.display.error_message.as_deref()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn lookups(&self) -> &L {
        &self.lookups
    }

    /// The screen became visible: first render, then start the pipeline.
    pub fn on_screen_activated(&mut self) {
        if self.state != AppState::Init {
            tracing::debug!("Screen activated while {}, ignoring", self.state);
            return;
        }
        self.update_controls(true);
        self.set_state(AppState::GettingLocation, None);
        self.get_location();
    }

    /// User asked for a fresh cycle. Only honoured from `Idle` or `Error`.
    pub fn on_retry_requested(&mut self) {
        if !self.state.is_cycle_end() {
            tracing::debug!("Retry requested while {}, ignoring", self.state);
            return;
        }
        tracing::info!("Retry requested");
        self.set_state(AppState::Init, None);
        self.set_state(AppState::GettingLocation, None);
        self.get_location();
    }

    /// Feed a lookup completion back into the state machine. Completions
    /// that are not the one the current state waits for are dropped.
    pub fn handle_message(&mut self, message: ScreenMessage) {
        match (self.state, message) {
            (AppState::GettingLocation, ScreenMessage::LocationDone(result)) => {
                self.on_location(result)
            }
            (AppState::GettingWeather, ScreenMessage::WeatherDone(result)) => {
                self.on_weather(result)
            }
            (AppState::GettingCountryName, ScreenMessage::PlaceNameDone(result)) => {
                self.on_place_name(result)
            }
            (state, message) => {
                tracing::warn!("Ignoring {} while {}", message.kind(), state);
            }
        }
    }

    /// Set the current state and render once. The message is kept only for `Error`.
    pub fn set_state(&mut self, new_state: AppState, error_message: Option<String>) {
        tracing::info!("State {} -> {}", self.state, new_state);
        self.state = new_state;

        match new_state {
            AppState::Init => {
                self.display = DisplayData::default();
                self.coordinates = None;
            }
            AppState::Error => {
                let message = error_message
                    .unwrap_or_else(|| LookupError::Unknown(String::new()).user_message());
                self.display.error_message = Some(message);
            }
            _ => {}
        }

        self.update_controls(false);
    }

    /// Render the current state. Reads stored data only.
    pub fn update_controls(&mut self, first_time: bool) {
        let frame = ViewFrame::build(self.state, &self.display);
        let animated = self.options.animations && !first_time;
        self.view.render(&frame, animated);
    }

    pub fn get_location(&mut self) {
        tracing::debug!("Requesting location");
        self.lookups.request_location();
    }

    pub fn get_weather(&mut self) {
        match self.coordinates {
            Some(coordinates) => {
                tracing::debug!("Requesting weather for {}", coordinates.display_short());
                self.lookups.request_weather(coordinates);
            }
            None => self.on_lookup_error(LookupError::Unknown(
                "weather requested without coordinates".into(),
            )),
        }
    }

    pub fn get_country_name(&mut self) {
        match self.coordinates {
            Some(coordinates) => {
                tracing::debug!("Requesting place name for {}", coordinates.display_short());
                self.lookups.request_place_name(coordinates);
            }
            None => self.on_lookup_error(LookupError::Unknown(
                "place name requested without coordinates".into(),
            )),
        }
    }

    fn on_location(&mut self, result: Result<Location, LocationError>) {
        match result {
            Ok(location) => {
                tracing::info!(
                    "Location {} from {:?}",
                    location.coordinates.display_short(),
                    location.source
                );
                self.coordinates = Some(location.coordinates);
                self.set_state(AppState::GettingWeather, None);
                self.get_weather();
            }
            Err(e) => self.on_lookup_error(e.into()),
        }
    }

    fn on_weather(&mut self, result: Result<CurrentWeather, WeatherError>) {
        match result {
            Ok(weather) => {
                self.display.apply_weather(&weather, &self.options.date_format);
                self.set_state(AppState::GettingCountryName, None);
                self.get_country_name();
            }
            Err(e) => self.on_lookup_error(e.into()),
        }
    }

    fn on_place_name(&mut self, result: Result<String, GeocodeError>) {
        match result {
            Ok(name) => {
                self.display.location_name = name;
                self.set_state(AppState::Idle, None);
            }
            Err(e) => self.on_lookup_error(e.into()),
        }
    }

    /// Fatal errors end the cycle in `Error`. A non-fatal one (the place
    /// name) falls back to the coordinates and still reaches `Idle`.
    fn on_lookup_error(&mut self, error: LookupError) {
        if error.is_fatal() {
            tracing::error!("{}", error);
            self.set_state(AppState::Error, Some(error.user_message()));
            return;
        }

        tracing::warn!("{}; showing coordinates instead", error);
        self.display.location_name = self
            .coordinates
            .map(|c| c.display_short())
            .unwrap_or_default();
        self.set_state(AppState::Idle, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingLookups {
        location: usize,
        weather: usize,
        place: usize,
    }

    impl Lookups for CountingLookups {
        fn request_location(&mut self) {
            self.location += 1;
        }
        fn request_weather(&mut self, _: Coordinates) {
            self.weather += 1;
        }
        fn request_place_name(&mut self, _: Coordinates) {
            self.place += 1;
        }
    }

    #[derive(Default)]
    struct CountingView {
        renders: usize,
    }

    impl ScreenView for CountingView {
        fn render(&mut self, _: &ViewFrame, _: bool) {
            self.renders += 1;
        }
    }

    fn controller() -> ScreenController<CountingLookups, CountingView> {
        ScreenController::new(
            CountingLookups::default(),
            CountingView::default(),
            DisplayOptions::default(),
        )
    }

    #[test]
    fn test_set_state_renders_exactly_once() {
        let mut c = controller();
        for state in [AppState::GettingLocation, AppState::Idle, AppState::Error, AppState::Init] {
            let before = c.view().renders;
            c.set_state(state, None);
            assert_eq!(c.view().renders, before + 1);
        }
    }

    #[test]
    fn test_error_without_message_gets_generic_text() {
        let mut c = controller();
        c.set_state(AppState::Error, None);
        assert!(c.error_message().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn test_get_weather_without_coordinates_is_error() {
        let mut c = controller();
        c.get_weather();
        assert_eq!(c.state(), AppState::Error);
        assert_eq!(c.lookups().weather, 0);
    }

    #[test]
    fn test_activation_twice_starts_once() {
        let mut c = controller();
        c.on_screen_activated();
        c.on_screen_activated();
        assert_eq!(c.lookups().location, 1);
        assert_eq!(c.state(), AppState::GettingLocation);
    }

    #[test]
    fn test_lookup_error_dispatches_on_fatality() {
        let mut c = controller();
        c.coordinates = Some(Coordinates::new(51.5, -0.12).unwrap());
        c.set_state(AppState::GettingCountryName, None);

        c.on_lookup_error(LookupError::from(GeocodeError::Api(503)));
        assert_eq!(c.state(), AppState::Idle);
        assert_eq!(c.display().location_name, "51.50, -0.12");
        assert_eq!(c.error_message(), None);

        c.set_state(AppState::GettingWeather, None);
        c.on_lookup_error(LookupError::from(WeatherError::Parse("bad".into())));
        assert_eq!(c.state(), AppState::Error);
        assert!(c.error_message().is_some());
    }

    #[test]
    fn test_retry_ignored_while_busy() {
        let mut c = controller();
        c.on_screen_activated();
        c.on_retry_requested();
        assert_eq!(c.lookups().location, 1);
    }
}
