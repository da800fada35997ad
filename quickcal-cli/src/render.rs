//! Terminal rendering for quickcal types.
//!
//! Calendar colors are plain enum values in quickcal-core; this is the only place
//! they turn into ANSI styling.

use owo_colors::{AnsiColors, OwoColorize};
use quickcal_core::{Calendar, CalendarColor, Occurrence};

pub trait Render {
    fn render(&self) -> String;
}

fn ansi(color: CalendarColor) -> AnsiColors {
    match color {
        CalendarColor::Black => AnsiColors::Black,
        CalendarColor::Red => AnsiColors::Red,
        CalendarColor::Green => AnsiColors::Green,
        CalendarColor::Yellow => AnsiColors::Yellow,
        CalendarColor::Blue => AnsiColors::Blue,
        CalendarColor::Magenta => AnsiColors::Magenta,
        CalendarColor::Cyan => AnsiColors::Cyan,
        CalendarColor::White => AnsiColors::White,
    }
}

fn paint(text: &str, color: Option<CalendarColor>) -> String {
    match color {
        Some(color) => text.color(ansi(color)).to_string(),
        None => text.to_string(),
    }
}

/// `<calendar>\t<start>\t<end>\t<summary>`, end left empty when unknown.
pub fn listing_line(occurrence: &Occurrence) -> String {
    let end = occurrence
        .end
        .as_ref()
        .map(|e| e.to_string())
        .unwrap_or_default();

    format!(
        "{}\t{}\t{}\t{}",
        occurrence.calendar_name(),
        occurrence.start,
        end,
        occurrence.summary
    )
}

impl Render for Occurrence {
    fn render(&self) -> String {
        let color = self.calendar.as_deref().and_then(|c| c.color);
        paint(&listing_line(self), color)
    }
}

impl Render for Calendar {
    fn render(&self) -> String {
        let marker = if self.default { " (default)" } else { "" };
        format!("{}{}", paint(&self.name, self.color), marker.dimmed())
    }
}
