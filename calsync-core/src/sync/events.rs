//! The events collection: scoped to the current identity, which authors new
//! events and is the only one allowed to edit them.

use super::collection::{Collection, Messages, Scope};
use super::engine::SyncEngine;
use crate::error::{CalSyncError, CalSyncResult};
use crate::event::{self, CalendarEvent, EventDraft, EventPatch};
use crate::remote::{Document, Record, RemoteStore};

pub struct Events;

impl Collection for Events {
    const NAME: &'static str = "events";
    const SCOPED: bool = true;

    type Item = CalendarEvent;
    type Draft = EventDraft;
    type Patch = EventPatch;

    const MESSAGES: Messages = Messages {
        load: "Could not load events",
        create: "Could not create the event. Please try again.",
        update: "Could not update the event. Please try again.",
        delete: "Could not delete the event. Please try again.",
    };

    fn decode(doc: &Document) -> Result<CalendarEvent, String> {
        CalendarEvent::from_document(doc)
    }

    fn encode_draft(draft: &EventDraft, scope: Option<&Scope>) -> CalSyncResult<Record> {
        let scope = scope.ok_or(CalSyncError::NotAuthenticated)?;
        Ok(draft.to_record(&scope.owner_id, &scope.owner_name))
    }

    fn encode_patch(patch: &EventPatch) -> CalSyncResult<Record> {
        Ok(patch.to_record())
    }
}

pub type EventSync<S> = SyncEngine<S, Events>;

impl<S: RemoteStore> SyncEngine<S, Events> {
    /// Whether the engine's current identity may edit `event`. Used to gate
    /// edit/delete in presentation; not a security boundary.
    pub fn can_edit(&self, event: &CalendarEvent) -> bool {
        event::can_edit(event, self.scope().map(|s| s.owner_id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventCategory;
    use crate::remote::MemoryStore;
    use crate::sync::Phase;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn doctor_appointment_scenario() {
        let store = MemoryStore::new();
        let mut events: EventSync<_> = SyncEngine::new(store.clone(), Some(Scope::new("u1", "Ana")));
        let mut rx = events.watch();

        events.start();
        assert!(events.is_loading());
        events.loaded().await.unwrap();
        assert!(!events.is_loading());
        assert!(events.items().is_empty());

        let t0 = Utc.with_ymd_and_hms(2026, 3, 20, 15, 0, 0).unwrap();
        let draft = EventDraft::new("Doctor", t0, t0 + Duration::hours(1))
            .with_category(EventCategory::Medical);
        let id = events.create(&draft).await.unwrap();

        rx.wait_for(|s| s.items.len() == 1).await.unwrap();
        let items = events.items();
        let doctor = &items[0];
        assert_eq!(doctor.id, id);
        assert_eq!(doctor.owner_id, "u1");
        assert_eq!(doctor.owner_name, "Ana");
        assert_eq!(doctor.category, EventCategory::Medical);
        assert_eq!(doctor.created_at, doctor.updated_at);

        assert!(events.can_edit(doctor));
        assert!(!event::can_edit(doctor, Some("u2")));

        let other: EventSync<_> = SyncEngine::new(store, Some(Scope::new("u2", "Luis")));
        assert!(!other.can_edit(doctor));
    }

    #[tokio::test]
    async fn edits_and_deletes_flow_back_through_the_subscription() {
        let store = MemoryStore::new();
        let mut events: EventSync<_> = SyncEngine::new(store.clone(), Some(Scope::new("u1", "Ana")));
        let mut rx = events.watch();
        events.start();

        let t0 = Utc.with_ymd_and_hms(2026, 3, 20, 15, 0, 0).unwrap();
        let id = events
            .create(&EventDraft::new("Padel", t0, t0 + Duration::hours(2)))
            .await
            .unwrap();
        rx.wait_for(|s| s.items.len() == 1).await.unwrap();

        let patch = EventPatch {
            title: Some("Padel with Luis".into()),
            category: Some(EventCategory::Recreation),
            ..EventPatch::default()
        };
        events.update(&id, &patch).await.unwrap();
        rx.wait_for(|s| s.items.first().is_some_and(|e| e.title == "Padel with Luis"))
            .await
            .unwrap();

        let edited = &events.items()[0];
        assert_eq!(edited.owner_id, "u1");
        assert_eq!(edited.category, EventCategory::Recreation);
        assert!(edited.updated_at >= edited.created_at);

        events.delete(&id).await.unwrap();
        rx.wait_for(|s| s.items.is_empty()).await.unwrap();
        assert_eq!(events.phase(), Phase::Live);
    }

    #[tokio::test]
    async fn updating_a_missing_event_fails_with_store_write_failed() {
        let store = MemoryStore::new();
        let events: EventSync<_> = SyncEngine::new(store, Some(Scope::new("u1", "Ana")));

        let err = events
            .update("ghost", &EventPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CalSyncError::StoreWriteFailed { .. }));
        assert_eq!(err.to_string(), Events::MESSAGES.update);
    }

    #[test]
    fn can_edit_without_scope_is_false() {
        let store = MemoryStore::new();
        let events: EventSync<_> = SyncEngine::new(store, None);
        let doc = crate::sync::testing::event_doc("e1", "u1");
        let event = CalendarEvent::from_document(&doc).unwrap();
        assert!(!events.can_edit(&event));
    }
}
