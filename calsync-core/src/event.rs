//! Calendar events.
//!
//! Events are authored by one identity (`owner_id`) and visible to everyone
//! sharing the calendar. Only the owner may edit or delete them, which is
//! checked by [`can_edit`] on the presentation side.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, Utc};
use serde_json::Value;

use crate::constants::{CREATED_AT, UPDATED_AT};
use crate::remote::{Document, Record};
use crate::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventCategory {
    Medical,
    Recreation,
    Payment,
    Personal,
    Work,
    #[default]
    Other,
}

impl EventCategory {
    pub const ALL: [EventCategory; 6] = [
        EventCategory::Medical,
        EventCategory::Recreation,
        EventCategory::Payment,
        EventCategory::Personal,
        EventCategory::Work,
        EventCategory::Other,
    ];

    /// Stored name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Medical => "medical",
            EventCategory::Recreation => "recreation",
            EventCategory::Payment => "payment",
            EventCategory::Personal => "personal",
            EventCategory::Work => "work",
            EventCategory::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventCategory::Medical => "Medical",
            EventCategory::Recreation => "Recreation",
            EventCategory::Payment => "Payment",
            EventCategory::Personal => "Personal",
            EventCategory::Work => "Work",
            EventCategory::Other => "Other",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = String;

    /// Accepts the stored names plus the legacy Spanish ones.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "medical" | "medico" => Ok(EventCategory::Medical),
            "recreation" | "padel" => Ok(EventCategory::Recreation),
            "payment" | "pago" => Ok(EventCategory::Payment),
            "personal" => Ok(EventCategory::Personal),
            "work" | "trabajo" => Ok(EventCategory::Work),
            "other" | "otro" => Ok(EventCategory::Other),
            other => Err(format!(
                "Unknown category '{}'. Expected one of: {}",
                other,
                EventCategory::ALL.map(|c| c.as_str()).join(", ")
            )),
        }
    }
}

/// A calendar event as materialized from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: Option<String>,
    pub category: EventCategory,
    pub owner_id: String,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalendarEvent {
    /// Build an event from a stored document.
    ///
    /// Missing title, description, category and audit stamps fall back to
    /// defaults. A record without a usable `start`, `end` or `ownerId` cannot
    /// be shown or attributed, so it is rejected with the reason.
    pub fn from_document(doc: &Document) -> Result<Self, String> {
        let start = doc
            .get("start")
            .and_then(timestamp::parse)
            .ok_or("missing or invalid start")?;
        let end = doc
            .get("end")
            .and_then(timestamp::parse)
            .ok_or("missing or invalid end")?;
        let owner_id = owner_field(doc, "ownerId", "userId").ok_or("missing ownerId")?;

        let now = Utc::now();
        let category = match doc.get_str("category") {
            Some(raw) => raw.parse::<EventCategory>().unwrap_or_else(|_| {
                tracing::debug!(id = %doc.id, category = raw, "unknown category, using other");
                EventCategory::Other
            }),
            None => EventCategory::Other,
        };

        Ok(CalendarEvent {
            id: doc.id.clone(),
            title: doc.get_str("title").unwrap_or_default().to_string(),
            start,
            end,
            description: doc
                .get_str("description")
                .filter(|d| !d.is_empty())
                .map(String::from),
            category,
            owner_id: owner_id.to_string(),
            owner_name: owner_field(doc, "ownerName", "userName")
                .unwrap_or_default()
                .to_string(),
            created_at: doc.get(CREATED_AT).and_then(timestamp::parse).unwrap_or(now),
            updated_at: doc.get(UPDATED_AT).and_then(timestamp::parse).unwrap_or(now),
        })
    }

    /// Whether the event starts on today's local date.
    pub fn is_today(&self) -> bool {
        self.start.with_timezone(&Local).date_naive() == Local::now().date_naive()
    }

    pub fn is_past(&self) -> bool {
        self.start < Utc::now()
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Older records name the author `userId`/`userName`.
fn owner_field<'a>(doc: &'a Document, field: &str, legacy: &str) -> Option<&'a str> {
    doc.get_str(field)
        .or_else(|| doc.get_str(legacy))
        .filter(|value| !value.is_empty())
}

/// Returns `true` iff `identity_id` is present, non-empty and owns `event`.
pub fn can_edit(event: &CalendarEvent, identity_id: Option<&str>) -> bool {
    match identity_id {
        Some(id) if !id.is_empty() => event.owner_id == id,
        _ => false,
    }
}

/// Input for creating an event. Ownership is added from the scope at write
/// time, audit stamps by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: Option<String>,
    pub category: EventCategory,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        EventDraft {
            title: title.into(),
            start,
            end,
            description: None,
            category: EventCategory::Other,
        }
    }

    pub fn with_category(mut self, category: EventCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn to_record(&self, owner_id: &str, owner_name: &str) -> Record {
        let mut record = Record::new();
        record.insert("title".into(), Value::String(self.title.clone()));
        record.insert("start".into(), timestamp::to_value(&self.start));
        record.insert("end".into(), timestamp::to_value(&self.end));
        if let Some(description) = &self.description {
            record.insert("description".into(), Value::String(description.clone()));
        }
        record.insert("category".into(), Value::String(self.category.as_str().into()));
        record.insert("ownerId".into(), Value::String(owner_id.into()));
        record.insert("ownerName".into(), Value::String(owner_name.into()));
        record
    }
}

/// Partial update of an event. `owner_id` is immutable and has no field here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub category: Option<EventCategory>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        if let Some(title) = &self.title {
            record.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(start) = &self.start {
            record.insert("start".into(), timestamp::to_value(start));
        }
        if let Some(end) = &self.end {
            record.insert("end".into(), timestamp::to_value(end));
        }
        if let Some(description) = &self.description {
            let value = match description {
                Some(d) => Value::String(d.clone()),
                None => Value::Null,
            };
            record.insert("description".into(), value);
        }
        if let Some(category) = &self.category {
            record.insert("category".into(), Value::String(category.as_str().into()));
        }
        record
    }
}
