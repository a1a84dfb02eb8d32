//! Natural-language date input for event commands.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};

/// A parsed start or end. `timed` is false when the user only gave a date,
/// in which case `at` is local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct When {
    pub at: DateTime<Utc>,
    pub timed: bool,
}

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thur", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    let lower = input.to_lowercase();
    lower
        .split_whitespace()
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| *full)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Interpret a wall-clock time in the local zone. Times skipped by a DST
/// jump resolve to the earliest valid reading.
fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("{} does not exist in the local time zone", naive))
}

/// Parse a natural language date/time string ("tomorrow 3pm", "sat",
/// "march 20 15:00"). Inputs without a time component land on midnight.
pub fn parse_when(input: &str) -> Result<When> {
    let expanded = expand_abbreviations(input);
    let dt = fuzzydate::parse(&expanded)
        .map_err(|_| anyhow::anyhow!("Could not parse date/time: \"{}\"", input))?;

    if has_time_component(input) {
        Ok(When {
            at: local_to_utc(dt)?,
            timed: true,
        })
    } else {
        let midnight = dt.date().and_time(chrono::NaiveTime::MIN);
        Ok(When {
            at: local_to_utc(midnight)?,
            timed: false,
        })
    }
}

/// Check if the user's input string contains time-related tokens.
fn has_time_component(input: &str) -> bool {
    let lower = input.to_lowercase();

    if lower.contains("noon") || lower.contains("midnight") {
        return true;
    }

    // am/pm right after a digit, optionally with one space ("6pm", "6 pm")
    let bytes = lower.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if (b == b'a' || b == b'p') && i + 1 < bytes.len() && bytes[i + 1] == b'm' {
            if i > 0 && bytes[i - 1].is_ascii_digit() {
                return true;
            }
            if i > 1 && bytes[i - 1] == b' ' && bytes[i - 2].is_ascii_digit() {
                return true;
            }
        }
    }

    // HH:MM
    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' {
            let has_digit_before = i > 0 && bytes[i - 1].is_ascii_digit();
            let has_digit_after = i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit();
            if has_digit_before && has_digit_after {
                return true;
            }
        }
    }

    // "at 3", "friday at 15"
    if let Some(pos) = lower.find(" at ") {
        if lower[pos + 4..].starts_with(|c: char| c.is_ascii_digit()) {
            return true;
        }
    }
    if let Some(after) = lower.strip_prefix("at ") {
        if after.starts_with(|c: char| c.is_ascii_digit()) {
            return true;
        }
    }

    false
}

/// Parse an end input: a duration first (humantime), then a date/time
/// (fuzzydate), optionally prefixed by "until" or "to".
pub fn parse_end(input: &str, start: &When) -> Result<DateTime<Utc>> {
    if let Ok(end) = try_apply_duration(start.at, input) {
        return Ok(end);
    }

    let cleaned = input
        .strip_prefix("until ")
        .or_else(|| input.strip_prefix("to "))
        .unwrap_or(input);

    Ok(parse_when(cleaned)?.at)
}

pub fn apply_duration(start: DateTime<Utc>, input: &str) -> Result<DateTime<Utc>> {
    try_apply_duration(start, input)
        .with_context(|| format!("Could not parse duration: \"{}\"", input))
}

fn try_apply_duration(start: DateTime<Utc>, input: &str) -> Result<DateTime<Utc>> {
    let std_dur = humantime::parse_duration(input).map_err(|e| anyhow::anyhow!("{}", e))?;
    let chrono_dur = Duration::from_std(std_dur).context("Duration too large")?;
    shift_by(start, chrono_dur)
}

/// `start + by`. Fails when the result is outside the representable range.
pub fn shift_by(start: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>> {
    start
        .checked_add_signed(by)
        .context("Duration too large")
}

/// +1 hour for timed starts, +1 day for date-only starts.
pub fn default_end(start: &When) -> Result<DateTime<Utc>> {
    let length = if start.timed {
        Duration::hours(1)
    } else {
        Duration::days(1)
    };
    shift_by(start.at, length)
}
