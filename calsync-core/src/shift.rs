//! Shift (turno) definitions: reusable, styled schedule slots that can be
//! applied to calendar cells. Shifts are global, not owned by any identity.

use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde_json::Value;

use crate::constants::{
    CREATED_AT, DEFAULT_BACKGROUND_COLOR, DEFAULT_TEXT_COLOR, DEFAULT_TEXT_SIZE, MAX_TEXT_SIZE,
    MIN_TEXT_SIZE, UPDATED_AT,
};
use crate::remote::{Document, Record};
use crate::timestamp;

const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq)]
pub struct Shift {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
    pub background_color: String,
    pub text_color: String,
    pub text_size: u8,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    /// Build a shift from a stored document, defaulting every missing field.
    pub fn from_document(doc: &Document) -> Result<Self, String> {
        let now = Utc::now();

        Ok(Shift {
            id: doc.id.clone(),
            name: doc.get_str("name").unwrap_or_default().to_string(),
            abbreviation: doc.get_str("abbreviation").unwrap_or_default().to_string(),
            background_color: color(doc, "backgroundColor", DEFAULT_BACKGROUND_COLOR),
            text_color: color(doc, "textColor", DEFAULT_TEXT_COLOR),
            text_size: text_size(doc.get("textSize")),
            start_time: doc.get_str("startTime").and_then(parse_time),
            end_time: doc.get_str("endTime").and_then(parse_time),
            created_at: doc.get(CREATED_AT).and_then(timestamp::parse).unwrap_or(now),
            updated_at: doc.get(UPDATED_AT).and_then(timestamp::parse).unwrap_or(now),
        })
    }

    /// `"(08:00-20:00)"` when both ends are set, otherwise empty.
    pub fn time_range_label(&self) -> String {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => format!(
                "({}-{})",
                start.format(TIME_FORMAT),
                end.format(TIME_FORMAT)
            ),
            _ => String::new(),
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.abbreviation)
    }
}

fn color(doc: &Document, field: &str, default: &str) -> String {
    doc.get_str(field)
        .filter(|c| !c.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Missing, zero or non-numeric sizes become the default; anything else is
/// clamped into the supported range.
fn text_size(value: Option<&Value>) -> u8 {
    let size = value.and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)));
    match size {
        None | Some(0) => DEFAULT_TEXT_SIZE,
        Some(n) => n.clamp(MIN_TEXT_SIZE as i64, MAX_TEXT_SIZE as i64) as u8,
    }
}

/// Parse `"HH:mm"`. Empty or malformed input is treated as unset.
pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match NaiveTime::parse_from_str(input, TIME_FORMAT) {
        Ok(time) => Some(time),
        Err(_) => {
            tracing::debug!(value = input, "ignoring malformed shift time");
            None
        }
    }
}

fn time_value(time: &NaiveTime) -> Value {
    Value::String(time.format(TIME_FORMAT).to_string())
}

/// Input for creating a shift.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftDraft {
    pub name: String,
    pub abbreviation: String,
    pub background_color: String,
    pub text_color: String,
    /// `None` lets the stored record fall back to the default size.
    pub text_size: Option<u8>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl ShiftDraft {
    pub fn new(name: impl Into<String>, abbreviation: impl Into<String>) -> Self {
        ShiftDraft {
            name: name.into(),
            abbreviation: abbreviation.into(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            text_size: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn colors(mut self, background: impl Into<String>, text: impl Into<String>) -> Self {
        self.background_color = background.into();
        self.text_color = text.into();
        self
    }

    pub fn text_size(mut self, size: u8) -> Self {
        self.text_size = Some(size);
        self
    }

    pub fn hours(mut self, start: &str, end: &str) -> Self {
        self.start_time = parse_time(start);
        self.end_time = parse_time(end);
        self
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("name".into(), Value::String(self.name.clone()));
        record.insert("abbreviation".into(), Value::String(self.abbreviation.clone()));
        record.insert("backgroundColor".into(), Value::String(self.background_color.clone()));
        record.insert("textColor".into(), Value::String(self.text_color.clone()));
        if let Some(size) = self.text_size {
            record.insert("textSize".into(), Value::from(size));
        }
        if let Some(start) = &self.start_time {
            record.insert("startTime".into(), time_value(start));
        }
        if let Some(end) = &self.end_time {
            record.insert("endTime".into(), time_value(end));
        }
        record
    }
}

/// Partial update of a shift.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftPatch {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub text_size: Option<u8>,
    /// `Some(None)` clears the time.
    pub start_time: Option<Option<NaiveTime>>,
    pub end_time: Option<Option<NaiveTime>>,
}

impl ShiftPatch {
    pub fn is_empty(&self) -> bool {
        *self == ShiftPatch::default()
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        let strings = [
            ("name", &self.name),
            ("abbreviation", &self.abbreviation),
            ("backgroundColor", &self.background_color),
            ("textColor", &self.text_color),
        ];
        for (field, value) in strings {
            if let Some(value) = value {
                record.insert(field.into(), Value::String(value.clone()));
            }
        }
        if let Some(size) = self.text_size {
            record.insert("textSize".into(), Value::from(size));
        }
        for (field, value) in [("startTime", &self.start_time), ("endTime", &self.end_time)] {
            if let Some(time) = value {
                record.insert(field.into(), time.as_ref().map_or(Value::Null, time_value));
            }
        }
        record
    }
}

/// The built-in shift catalog offered for import on a fresh install.
pub fn default_catalog() -> Vec<ShiftDraft> {
    vec![
        ShiftDraft::new("Nuevo", "F.A")
            .colors("#DC143C", "#FFFFFF")
            .text_size(14),
        ShiftDraft::new("S. Santa", "S.Santa")
            .colors("#87CEEB", "#000000")
            .text_size(12),
        ShiftDraft::new("Feria", "Feria")
            .colors("#00BFFF", "#FFFFFF")
            .text_size(12),
        ShiftDraft::new("Descanso", "Descanso")
            .colors("#6B8E23", "#FFFFFF")
            .text_size(11),
        ShiftDraft::new("D1", "D1")
            .colors("#1E90FF", "#FFFFFF")
            .text_size(16)
            .hours("08:00", "20:00"),
        ShiftDraft::new("D2", "D2")
            .colors("#DC143C", "#FFFFFF")
            .text_size(16)
            .hours("20:00", "08:00"),
        ShiftDraft::new("Tarde", "T")
            .colors("#FFA07A", "#000000")
            .text_size(14)
            .hours("14:00", "22:00"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(fields: Value) -> Document {
        Document::new("s1", fields.as_object().cloned().unwrap())
    }

    #[test]
    fn empty_record_gets_every_default() {
        let shift = Shift::from_document(&doc(json!({}))).unwrap();

        assert_eq!(shift.name, "");
        assert_eq!(shift.abbreviation, "");
        assert_eq!(shift.background_color, "#FFFFFF");
        assert_eq!(shift.text_color, "#000000");
        assert_eq!(shift.text_size, 12);
        assert_eq!(shift.start_time, None);
        assert_eq!(shift.end_time, None);
    }

    #[test]
    fn text_size_defaults_and_clamps() {
        assert_eq!(text_size(None), 12);
        assert_eq!(text_size(Some(&json!(0))), 12);
        assert_eq!(text_size(Some(&json!("big"))), 12);
        assert_eq!(text_size(Some(&json!(16))), 16);
        assert_eq!(text_size(Some(&json!(15.6))), 16);
        assert_eq!(text_size(Some(&json!(3))), 8);
        assert_eq!(text_size(Some(&json!(99))), 24);
    }

    #[test]
    fn times_parse_and_bad_ones_are_unset() {
        let shift = Shift::from_document(&doc(json!({
            "name": "D1",
            "startTime": "08:00",
            "endTime": "",
        })))
        .unwrap();
        assert_eq!(shift.start_time, NaiveTime::from_hms_opt(8, 0, 0));
        assert_eq!(shift.end_time, None);

        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time(" 20:30 "), NaiveTime::from_hms_opt(20, 30, 0));
    }

    #[test]
    fn time_range_label_needs_both_ends() {
        let mut shift = Shift::from_document(&doc(json!({
            "startTime": "08:00",
            "endTime": "20:00",
        })))
        .unwrap();
        assert_eq!(shift.time_range_label(), "(08:00-20:00)");

        shift.end_time = None;
        assert_eq!(shift.time_range_label(), "");
    }

    #[test]
    fn draft_without_size_omits_it() {
        let record = ShiftDraft::new("Tarde", "T").to_record();
        assert!(!record.contains_key("textSize"));
        assert!(!record.contains_key("startTime"));

        let shift = Shift::from_document(&Document::new("s1", record)).unwrap();
        assert_eq!(shift.text_size, 12);
    }

    #[test]
    fn patch_can_clear_times() {
        let patch = ShiftPatch {
            text_size: Some(18),
            start_time: Some(None),
            ..ShiftPatch::default()
        };
        let record = patch.to_record();
        assert_eq!(record.len(), 2);
        assert_eq!(record["textSize"], json!(18));
        assert_eq!(record["startTime"], Value::Null);
    }

    #[test]
    fn default_catalog_matches_import_order() {
        let catalog = default_catalog();
        let names: Vec<_> = catalog.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["Nuevo", "S. Santa", "Feria", "Descanso", "D1", "D2", "Tarde"]
        );

        let d2 = &catalog[5];
        assert_eq!(d2.start_time, NaiveTime::from_hms_opt(20, 0, 0));
        assert_eq!(d2.end_time, NaiveTime::from_hms_opt(8, 0, 0));
        assert!(catalog[0].start_time.is_none());
    }
}
