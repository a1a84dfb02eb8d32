//! TUI rendering traits for calsync types.
//!
//! Extension traits that add colored terminal rendering to calsync-core
//! types using owo_colors.

use calsync_core::{CalendarEvent, EventCategory, Identity, Shift};
use chrono::Local;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventCategory {
    fn render(&self) -> String {
        let label = self.label();
        match self {
            EventCategory::Medical => label.red().to_string(),
            EventCategory::Recreation => label.green().to_string(),
            EventCategory::Payment => label.yellow().to_string(),
            EventCategory::Personal => label.magenta().to_string(),
            EventCategory::Work => label.blue().to_string(),
            EventCategory::Other => label.dimmed().to_string(),
        }
    }
}

impl Render for CalendarEvent {
    /// One line: time range, title, category, author and id.
    fn render(&self) -> String {
        let start = self.start.with_timezone(&Local);
        let end = self.end.with_timezone(&Local);
        let time = if start.date_naive() == end.date_naive() {
            format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
        } else {
            format!("{} → {}", start.format("%H:%M"), end.format("%a %b %-d %H:%M"))
        };

        let title = if self.is_past() {
            self.title.dimmed().to_string()
        } else {
            self.title.clone()
        };

        format!(
            "  {:>11} {} [{}] {} {}",
            time,
            title,
            self.category.render(),
            format!("by {}", self.owner_name).dimmed(),
            self.id.dimmed()
        )
    }
}

impl Render for Shift {
    fn render(&self) -> String {
        let badge = format!(" {} ", self.abbreviation);
        let badge = match (hex_rgb(&self.background_color), hex_rgb(&self.text_color)) {
            (Some((br, bg, bb)), Some((fr, fg, fb))) => badge
                .on_truecolor(br, bg, bb)
                .truecolor(fr, fg, fb)
                .to_string(),
            _ => badge,
        };

        let hours = self.time_range_label();
        format!(
            "  {} {} {} {}",
            badge,
            self.name,
            hours.dimmed(),
            self.id.dimmed()
        )
    }
}

impl Render for Identity {
    fn render(&self) -> String {
        match &self.email {
            Some(email) => format!("{} {}", self.name().bold(), format!("<{email}>").dimmed()),
            None => self.name().bold().to_string(),
        }
    }
}

/// Parse `#RRGGBB`.
fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Day heading for grouped event lists: "Today", "Tomorrow" or "Wed Feb 25".
pub fn date_label(event: &CalendarEvent) -> String {
    if event.is_today() {
        return "Today".to_string();
    }

    let today = Local::now().date_naive();
    let date = event.start.with_timezone(&Local).date_naive();

    match (date - today).num_days() {
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d %Y").to_string(),
    }
}
