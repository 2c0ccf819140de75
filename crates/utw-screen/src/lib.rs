//! The weather screen: a state machine that runs location → weather →
//! place name lookups in order and renders loading, info or error panels.

pub mod controller;
pub mod display;
pub mod error;
pub mod lookups;
pub mod state;
pub mod view;

pub use controller::ScreenController;
pub use display::{DisplayData, DisplayOptions, Panel, ViewFrame};
pub use error::LookupError;
pub use lookups::{AsyncLookups, Lookups, ScreenMessage};
pub use state::AppState;
pub use view::{ScreenView, TerminalView};
