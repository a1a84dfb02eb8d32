//! In-process collection store.
//!
//! Keeps every collection in memory, stamps writes with `Utc::now()`, and
//! fans the full ordered snapshot out to every open subscription after each
//! successful write. Optionally persists itself to a JSON file so separate
//! runs of the CLI see the same data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Direction, Document, OrderBy, Push, Record, RemoteStore, StoreError, Subscription,
    SubscriptionSender, Write,
};

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    /// Documents per collection, in insertion order.
    collections: BTreeMap<String, Vec<Document>>,
    subscribers: BTreeMap<String, Vec<Subscriber>>,
    path: Option<PathBuf>,
    write_failure: Option<StoreError>,
}

struct Subscriber {
    order: OrderBy,
    sender: SubscriptionSender,
}

/// On-disk layout of a persisted store.
#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    #[serde(default)]
    collections: BTreeMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<StoreFile>(&content).map_err(|e| {
                StoreError::Serialization(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreFile::default(),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        tracing::debug!(path = %path.display(), collections = file.collections.len(), "opened store");

        let inner = Inner {
            collections: file.collections,
            path: Some(path),
            ..Inner::default()
        };
        Ok(MemoryStore {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    /// Make every subsequent write fail with `error` (or succeed again with `None`).
    pub fn fail_writes(&self, error: Option<StoreError>) {
        self.lock().write_failure = error;
    }

    /// Deliver a failure push to every open subscription of `collection`.
    pub fn break_subscriptions(&self, collection: &str, message: &str) {
        let mut inner = self.lock();
        if let Some(subs) = inner.subscribers.get_mut(collection) {
            subs.retain(|s| s.sender.send(Err(message.to_string())));
        }
    }

    /// Current contents of `collection` in insertion order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of subscriptions to `collection` that are still open.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.lock()
            .subscribers
            .get(collection)
            .map(|subs| subs.iter().filter(|s| !s.sender.is_closed()).count())
            .unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply `change` to one collection, persist, then notify subscribers.
    /// On any failure the collection is left untouched.
    fn write<T>(
        &self,
        collection: &str,
        change: impl FnOnce(&mut Vec<Document>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut inner = self.lock();

        if let Some(error) = &inner.write_failure {
            return Err(error.clone());
        }

        let previous = inner.collections.get(collection).cloned();
        let docs = inner.collections.entry(collection.to_string()).or_default();
        let result = change(docs)?;

        if let Err(e) = inner.persist() {
            match previous {
                Some(docs) => inner.collections.insert(collection.to_string(), docs),
                None => inner.collections.remove(collection),
            };
            return Err(e);
        }

        inner.notify(collection);
        Ok(result)
    }
}

impl Inner {
    fn snapshot(&self, collection: &str, order: &OrderBy) -> Vec<Document> {
        let mut docs = self.collections.get(collection).cloned().unwrap_or_default();
        // Stable sort; ties keep insertion order, reversed for descending.
        if order.direction == Direction::Desc {
            docs.reverse();
        }
        docs.sort_by(|a, b| order.compare(a, b));
        docs
    }

    fn notify(&mut self, collection: &str) {
        let Some(mut subs) = self.subscribers.remove(collection) else {
            return;
        };
        subs.retain(|s| {
            let push: Push = Ok(self.snapshot(collection, &s.order));
            s.sender.send(push)
        });
        self.subscribers.insert(collection.to_string(), subs);
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = StoreFile {
            collections: self.collections.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        write_atomic(path, json.as_bytes()).map_err(|e| StoreError::Io(e.to_string()))
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

fn server_now() -> serde_json::Value {
    serde_json::Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn stamped(write: Write) -> Record {
    let Write {
        mut fields,
        server_stamps,
    } = write;
    let now = server_now();
    for field in server_stamps {
        fields.insert(field, now.clone());
    }
    fields
}

impl RemoteStore for MemoryStore {
    fn subscribe(&self, collection: &str, order: &OrderBy) -> Subscription {
        let (sender, subscription) = Subscription::channel();
        let mut inner = self.lock();

        sender.send(Ok(inner.snapshot(collection, order)));
        inner
            .subscribers
            .entry(collection.to_string())
            .or_default()
            .push(Subscriber {
                order: order.clone(),
                sender,
            });

        subscription
    }

    async fn insert(&self, collection: &str, write: Write) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let fields = stamped(write);

        self.write(collection, |docs| {
            docs.push(Document::new(id.clone(), fields));
            Ok(())
        })?;

        Ok(id)
    }

    async fn patch(&self, collection: &str, id: &str, write: Write) -> Result<(), StoreError> {
        let fields = stamped(write);

        self.write(collection, |docs| {
            let doc = docs
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            doc.fields.extend(fields);
            Ok(())
        })
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.write(collection, |docs| {
            docs.retain(|d| d.id != id);
            Ok(())
        })
    }
}
