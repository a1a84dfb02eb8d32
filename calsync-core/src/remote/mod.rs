//! The remote collection store capability.
//!
//! A store holds named collections of schemaless documents. Consumers open
//! ordered live subscriptions (each push is the complete, ordered contents of
//! the collection) and write through `insert`/`patch`/`remove`. Timestamps the
//! consumer wants stamped are named in [`Write::server_stamps`]; the store
//! fills them from its own clock.

pub mod memory;
pub mod subscription;

use std::cmp::Ordering;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;
pub use subscription::{Subscription, SubscriptionSender};

/// Field map of a stored document.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// One pushed update from a subscription: either the full ordered snapshot
/// or a failure notification.
pub type Push = Result<Vec<Document>, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Record,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Record) -> Self {
        Document {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy {
            field: field.into(),
            direction: Direction::Desc,
        }
    }

    /// Compare two documents by this ordering. Documents missing the field
    /// sort before those that have it (ascending).
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = compare_values(a.get(&self.field), b.get(&self.field));
        match self.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        }
    }
}

fn compare_values(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> Ordering {
    use serde_json::Value;

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// A write request: fields to set plus the names of fields the store must
/// stamp with its own clock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Write {
    pub fields: Record,
    pub server_stamps: Vec<String>,
}

impl Write {
    pub fn new(fields: Record) -> Self {
        Write {
            fields,
            server_stamps: Vec::new(),
        }
    }

    pub fn stamp(mut self, field: impl Into<String>) -> Self {
        self.server_stamps.push(field.into());
        self
    }
}

/// Errors reported by a store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Document '{id}' not found in '{collection}'")]
    NotFound { collection: String, id: String },

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Capability contract the sync engines are written against.
pub trait RemoteStore: Clone + Send + Sync + 'static {
    /// Open a live, ordered subscription to `collection`.
    ///
    /// Failures to establish or keep the channel are delivered as `Err`
    /// pushes, not returned here.
    fn subscribe(&self, collection: &str, order: &OrderBy) -> Subscription;

    /// Insert a new document. Returns the store-generated id.
    fn insert(
        &self,
        collection: &str,
        write: Write,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Merge `write` into an existing document.
    fn patch(
        &self,
        collection: &str,
        id: &str,
        write: Write,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn remove(&self, collection: &str, id: &str)
    -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, created: serde_json::Value) -> Document {
        let mut fields = Record::new();
        if !created.is_null() {
            fields.insert("createdAt".into(), created);
        }
        Document::new(id, fields)
    }

    #[test]
    fn descending_order_puts_newest_first_and_missing_last() {
        let mut docs = vec![
            doc("a", json!("2026-01-01T00:00:00.000000Z")),
            doc("b", serde_json::Value::Null),
            doc("c", json!("2026-03-01T00:00:00.000000Z")),
        ];
        let order = OrderBy::desc("createdAt");
        docs.sort_by(|a, b| order.compare(a, b));

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    #[test]
    fn numbers_compare_numerically() {
        let order = OrderBy::asc("n");
        let mut small = Record::new();
        small.insert("n".into(), json!(9));
        let mut big = Record::new();
        big.insert("n".into(), json!(10));

        assert_eq!(
            order.compare(&Document::new("s", small), &Document::new("b", big)),
            Ordering::Less
        );
    }

    #[test]
    fn null_fields_read_as_missing() {
        let mut fields = Record::new();
        fields.insert("description".into(), serde_json::Value::Null);
        let doc = Document::new("x", fields);
        assert!(doc.get("description").is_none());
        assert!(doc.get_str("description").is_none());
    }
}
