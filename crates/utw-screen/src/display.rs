//! Display data and the per-render view frame derived from it.

use std::fmt::Write;

use utw_core::{TemperatureUnit, UiConfig};
use utw_weather::CurrentWeather;

use crate::state::AppState;

const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Rendering preferences taken from `[ui]` in the config.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub date_format: String,
    pub animations: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions::from(&UiConfig::default())
    }
}

impl From<&UiConfig> for DisplayOptions {
    fn from(ui: &UiConfig) -> Self {
        Self {
            date_format: ui.date_format.clone(),
            animations: ui.animations,
        }
    }
}

/// Values bound to the screen's labels. Filled in as each lookup completes;
/// complete only once the controller reaches `Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayData {
    pub temperature: Option<f64>,
    pub unit: TemperatureUnit,
    pub description: String,
    pub icon: String,
    pub date: String,
    pub location_name: String,
    pub error_message: Option<String>,
}

impl DisplayData {
    /// Copy the weather fields, formatting the observation date in local time.
    pub fn apply_weather(&mut self, weather: &CurrentWeather, date_format: &str) {
        self.temperature = Some(weather.temperature);
        self.unit = weather.unit;
        self.description = weather.description().to_string();
        self.icon = weather.icon_name().to_string();

        let local = weather.local_observed_at();
        let mut date = String::new();
        if write!(date, "{}", local.format(date_format)).is_err() {
            tracing::warn!("Invalid date format {:?}, using {}", date_format, FALLBACK_DATE_FORMAT);
            date = local.format(FALLBACK_DATE_FORMAT).to_string();
        }
        self.date = date;
    }

    /// Whole-degree label such as "22°C"; empty until weather arrives.
    pub fn temperature_label(&self) -> String {
        match self.temperature {
            Some(t) => {
                let rounded = t.round();
                // avoid "-0°C"
                let rounded = if rounded == 0.0 { 0.0 } else { rounded };
                format!("{:.0}{}", rounded, self.unit.symbol())
            }
            None => String::new(),
        }
    }
}

/// Which of the mutually exclusive regions is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Loading,
    Info,
    Error,
}

/// Everything a view needs for one render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrame {
    pub state: AppState,
    pub loading_visible: bool,
    pub content_visible: bool,
    pub info_visible: bool,
    pub error_visible: bool,
    pub loading_caption: String,
    pub date: String,
    pub icon: String,
    pub description: String,
    pub temperature: String,
    pub location: String,
    pub error: String,
}

impl ViewFrame {
    pub fn build(state: AppState, data: &DisplayData) -> Self {
        let panel = match state {
            AppState::Idle => Panel::Info,
            AppState::Error => Panel::Error,
            _ => Panel::Loading,
        };

        Self {
            state,
            loading_visible: panel == Panel::Loading,
            content_visible: panel != Panel::Loading,
            info_visible: panel == Panel::Info,
            error_visible: panel == Panel::Error,
            loading_caption: state.loading_caption().to_string(),
            date: data.date.clone(),
            icon: data.icon.clone(),
            description: data.description.clone(),
            temperature: data.temperature_label(),
            location: data.location_name.clone(),
            error: data.error_message.clone().unwrap_or_default(),
        }
    }

    pub fn panel(&self) -> Panel {
        if self.info_visible {
            Panel::Info
        } else if self.error_visible {
            Panel::Error
        } else {
            Panel::Loading
        }
    }
}
