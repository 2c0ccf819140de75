//! Lookup dispatch: requests go out through `Lookups`, completions come back
//! to the screen's thread as `ScreenMessage`s.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use utw_weather::{
    Coordinates, CurrentWeather, GeocodeError, Geocoder, Location, LocationError,
    LocationProvider, WeatherError, WeatherProvider,
};

/// Completion of a single lookup
#[derive(Debug)]
pub enum ScreenMessage {
    LocationDone(Result<Location, LocationError>),
    WeatherDone(Result<CurrentWeather, WeatherError>),
    PlaceNameDone(Result<String, GeocodeError>),
}

impl ScreenMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ScreenMessage::LocationDone(_) => "location result",
            ScreenMessage::WeatherDone(_) => "weather result",
            ScreenMessage::PlaceNameDone(_) => "place name result",
        }
    }
}

/// Issues one-shot lookups. Each request must eventually produce exactly one
/// matching `ScreenMessage` for the controller.
pub trait Lookups {
    fn request_location(&mut self);
    fn request_weather(&mut self, coordinates: Coordinates);
    fn request_place_name(&mut self, coordinates: Coordinates);
}

/// Runs each lookup as a task on `runtime` and reports over a channel.
pub struct AsyncLookups {
    location: Arc<LocationProvider>,
    weather: Arc<WeatherProvider>,
    geocoder: Arc<Geocoder>,
    tx: mpsc::UnboundedSender<ScreenMessage>,
    runtime: Handle,
}

impl AsyncLookups {
    pub fn new(
        location: LocationProvider,
        weather: WeatherProvider,
        geocoder: Geocoder,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<ScreenMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let lookups = Self {
            location: Arc::new(location),
            weather: Arc::new(weather),
            geocoder: Arc::new(geocoder),
            tx,
            runtime,
        };
        (lookups, rx)
    }

    fn send(tx: &mpsc::UnboundedSender<ScreenMessage>, message: ScreenMessage) {
        let kind = message.kind();
        if tx.send(message).is_err() {
            tracing::debug!("Screen closed before {} was delivered", kind);
        }
    }
}

impl Lookups for AsyncLookups {
    fn request_location(&mut self) {
        let tx = self.tx.clone();
        let provider = Arc::clone(&self.location);
        self.runtime.spawn(async move {
            let result = provider.locate().await;
            Self::send(&tx, ScreenMessage::LocationDone(result));
        });
    }

    fn request_weather(&mut self, coordinates: Coordinates) {
        let tx = self.tx.clone();
        let provider = Arc::clone(&self.weather);
        self.runtime.spawn(async move {
            let result = provider.fetch_current(&coordinates).await;
            Self::send(&tx, ScreenMessage::WeatherDone(result));
        });
    }

    fn request_place_name(&mut self, coordinates: Coordinates) {
        let tx = self.tx.clone();
        let geocoder = Arc::clone(&self.geocoder);
        self.runtime.spawn(async move {
            let result = geocoder.reverse(&coordinates).await;
            Self::send(&tx, ScreenMessage::PlaceNameDone(result));
        });
    }
}
