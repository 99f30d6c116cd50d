//! Semantic color palette for terminal output.
//!
//! Uses owo-colors; every helper degrades to plain text under `--no-color`.

use owo_colors::{OwoColorize, Style};

fn paint(text: &dyn std::fmt::Display, style: Style) -> String {
    if super::no_color() {
        text.to_string()
    } else {
        text.style(style).to_string()
    }
}

/// Trait extension to apply semantic styles.
pub trait SemanticStyle: std::fmt::Display + Sized {
    /// Passing probes and clean summaries (green bold).
    fn success(&self) -> String {
        paint(self, Style::new().green().bold())
    }

    /// Failing probes and fatal errors (red bold).
    fn error(&self) -> String {
        paint(self, Style::new().red().bold())
    }

    /// Skips and missing definitions (yellow).
    fn warning(&self) -> String {
        paint(self, Style::new().yellow())
    }

    /// Secondary transcript labels (dimmed).
    fn muted(&self) -> String {
        paint(self, Style::new().dimmed())
    }

    /// Identity headers (bold).
    fn header(&self) -> String {
        paint(self, Style::new().bold())
    }

    /// Commands (blue).
    fn code(&self) -> String {
        paint(self, Style::new().blue())
    }
}

impl<T: std::fmt::Display> SemanticStyle for T {}
