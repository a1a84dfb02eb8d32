//! Scripted store for engine tests: records every call and only pushes what
//! the test tells it to.

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::remote::{
    Document, OrderBy, RemoteStore, StoreError, Subscription, SubscriptionSender, Write,
};

#[derive(Clone, Default)]
pub struct ScriptedStore {
    inner: Arc<Mutex<Scripted>>,
}

#[derive(Default)]
struct Scripted {
    senders: Vec<SubscriptionSender>,
    calls: Vec<String>,
    writes: Vec<Write>,
    failure: Option<StoreError>,
    next_id: u32,
}

impl ScriptedStore {
    pub fn push(&self, docs: Vec<Document>) {
        let inner = self.inner.lock().unwrap();
        for sender in &inner.senders {
            sender.send(Ok(docs.clone()));
        }
    }

    pub fn push_error(&self, message: &str) {
        let inner = self.inner.lock().unwrap();
        for sender in &inner.senders {
            sender.send(Err(message.to_string()));
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn last_write(&self) -> Option<Write> {
        self.inner.lock().unwrap().writes.last().cloned()
    }

    pub fn fail_writes(&self, error: StoreError) {
        self.inner.lock().unwrap().failure = Some(error);
    }

    pub fn recover(&self) {
        self.inner.lock().unwrap().failure = None;
    }

    pub fn open_subscriptions(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.senders.iter().filter(|s| !s.is_closed()).count()
    }

    fn record(&self, call: String, write: Option<Write>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        if let Some(write) = write {
            inner.writes.push(write);
        }
        match &inner.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl RemoteStore for ScriptedStore {
    fn subscribe(&self, collection: &str, _order: &OrderBy) -> Subscription {
        let (sender, subscription) = Subscription::channel();
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("subscribe {collection}"));
        inner.senders.push(sender);
        subscription
    }

    async fn insert(&self, collection: &str, write: Write) -> Result<String, StoreError> {
        self.record(format!("insert {collection}"), Some(write))?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        Ok(format!("id-{}", inner.next_id))
    }

    async fn patch(&self, collection: &str, id: &str, write: Write) -> Result<(), StoreError> {
        self.record(format!("patch {collection} {id}"), Some(write))
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.record(format!("remove {collection} {id}"), None)
    }
}

pub fn event_doc(id: &str, owner: &str) -> Document {
    let fields = json!({
        "title": format!("Event {id}"),
        "start": "2026-03-20T15:00:00Z",
        "end": "2026-03-20T16:00:00Z",
        "category": "personal",
        "ownerId": owner,
        "ownerName": owner,
        "createdAt": "2026-03-01T10:00:00.000000Z",
        "updatedAt": "2026-03-01T10:00:00.000000Z",
    });
    Document::new(id, fields.as_object().cloned().unwrap_or_default())
}

pub fn shift_doc(id: &str, name: &str) -> Document {
    let fields = json!({
        "name": name,
        "abbreviation": name,
        "backgroundColor": "#1E90FF",
        "textColor": "#FFFFFF",
        "textSize": 16,
    });
    Document::new(id, fields.as_object().cloned().unwrap_or_default())
}
