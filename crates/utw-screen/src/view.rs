//! Render targets for the screen.

use std::io::Write;

use crate::display::{Panel, ViewFrame};

/// A surface that shows one `ViewFrame` at a time.
pub trait ScreenView {
    /// `animated` is false for the first render of a screen visit.
    fn render(&mut self, frame: &ViewFrame, animated: bool);
}

/// Plain-text view writing each frame to a terminal.
pub struct TerminalView<W: Write> {
    out: W,
    last_panel: Option<Panel>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            last_panel: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &ViewFrame, animated: bool) -> std::io::Result<()> {
        let panel = frame.panel();
        if !animated {
            writeln!(self.out, "Under The Weather")?;
        } else if self.last_panel != Some(panel) {
            writeln!(self.out, "{}", "─".repeat(32))?;
        }

        match panel {
            Panel::Loading => {
                writeln!(self.out, "⏳ {}", frame.loading_caption)?;
            }
            Panel::Info => {
                writeln!(self.out, "{}", frame.date)?;
                writeln!(self.out, "{} {}", icon_glyph(&frame.icon), frame.description)?;
                writeln!(self.out, "{}", frame.temperature)?;
                writeln!(self.out, "{}", frame.location)?;
                writeln!(self.out, "[r] refresh  [q] quit")?;
            }
            Panel::Error => {
                writeln!(self.out, "⚠ {}", frame.error)?;
                writeln!(self.out, "[r] retry  [q] quit")?;
            }
        }

        self.last_panel = Some(panel);
        self.out.flush()
    }
}

impl<W: Write> ScreenView for TerminalView<W> {
    fn render(&mut self, frame: &ViewFrame, animated: bool) {
        if let Err(e) = self.write_frame(frame, animated) {
            tracing::warn!("Failed to render frame: {}", e);
        }
    }
}

fn icon_glyph(icon: &str) -> &'static str {
    match icon {
        "sun" => "☀",
        "moon" => "☾",
        "cloud_sun" => "⛅",
        "cloud_moon" | "cloud" => "☁",
        "cloud_fog" => "🌫",
        "cloud_rain" => "🌧",
        "cloud_snow" => "🌨",
        "cloud_lightning" => "⛈",
        _ => "?",
    }
}
