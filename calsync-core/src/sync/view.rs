//! View-state adapter: keeps one engine in step with the current identity
//! and exposes what presentation code reads and calls.

use tokio::sync::watch;
use tracing::debug;

use super::collection::{Collection, Scope};
use super::engine::{Phase, SyncEngine, SyncState};
use super::events::Events;
use super::shifts::Shifts;
use crate::error::CalSyncResult;
use crate::event::CalendarEvent;
use crate::identity::Identity;
use crate::remote::RemoteStore;

pub struct CollectionView<S: RemoteStore, C: Collection> {
    engine: SyncEngine<S, C>,
}

impl<S: RemoteStore, C: Collection> CollectionView<S, C> {
    pub fn new(store: S) -> Self {
        CollectionView {
            engine: SyncEngine::new(store, None),
        }
    }

    pub fn engine(&self) -> &SyncEngine<S, C> {
        &self.engine
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.engine.scope()
    }

    /// Point the view at another scope.
    ///
    /// Same owner id as before keeps the subscription and only picks up the
    /// new display name. Anything else tears the current
    /// subscription down and empties the list before the new scope's first
    /// push can arrive, so one identity's items are never shown to another.
    /// Unscoped collections only record the scope.
    pub fn set_scope(&mut self, scope: Option<Scope>) {
        if !C::SCOPED {
            self.engine.set_scope(scope);
            return;
        }

        let current = self.engine.scope().map(|s| s.owner_id.as_str());
        let next = scope.as_ref().map(|s| s.owner_id.as_str());
        if current == next && self.engine.is_active() == scope.is_some() {
            self.engine.set_scope(scope);
            return;
        }

        debug!(collection = C::NAME, from = ?current, to = ?next, "scope changed");
        self.engine.reset();
        let present = scope.is_some();
        self.engine.set_scope(scope);
        if present {
            self.engine.start();
        }
    }

    pub fn follow_identity(&mut self, identity: Option<&Identity>) {
        self.set_scope(identity.map(Identity::scope));
    }

    /// Wait for the next identity change and follow it. Returns `false` once
    /// the identity provider is gone.
    pub async fn next_identity(&mut self, identity: &mut watch::Receiver<Option<Identity>>) -> bool {
        if identity.changed().await.is_err() {
            return false;
        }
        let current = identity.borrow_and_update().clone();
        self.follow_identity(current.as_ref());
        true
    }

    /// Start syncing if not already. Scoped collections without a scope stay
    /// idle.
    pub fn mount(&mut self) {
        if self.engine.is_active() {
            return;
        }
        if C::SCOPED && self.engine.scope().is_none() {
            return;
        }
        self.engine.start();
    }

    pub fn unmount(&mut self) {
        self.engine.stop();
    }

    pub fn state(&self) -> SyncState<C::Item> {
        self.engine.state()
    }

    pub fn items(&self) -> Vec<C::Item> {
        self.engine.items()
    }

    pub fn is_loading(&self) -> bool {
        self.engine.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.engine.error()
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn watch(&self) -> watch::Receiver<SyncState<C::Item>> {
        self.engine.watch()
    }

    pub async fn loaded(&self) -> CalSyncResult<()> {
        self.engine.loaded().await
    }

    pub async fn create(&self, draft: &C::Draft) -> CalSyncResult<String> {
        self.engine.create(draft).await
    }

    pub async fn update(&self, id: &str, patch: &C::Patch) -> CalSyncResult<()> {
        self.engine.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> CalSyncResult<()> {
        self.engine.delete(id).await
    }
}

impl<S: RemoteStore> CollectionView<S, Events> {
    pub fn can_edit(&self, event: &CalendarEvent) -> bool {
        self.engine.can_edit(event)
    }
}

impl<S: RemoteStore> CollectionView<S, Shifts> {
    pub async fn import_defaults(&self) -> CalSyncResult<usize> {
        self.engine.import_defaults().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDraft;
    use crate::identity::IdentityProvider;
    use crate::sync::testing::{ScriptedStore, event_doc, shift_doc};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn no_identity_means_idle_without_subscription() {
        let store = ScriptedStore::default();
        let mut view: CollectionView<_, Events> = CollectionView::new(store.clone());

        view.mount();
        view.set_scope(None);

        assert_eq!(view.phase(), Phase::Idle);
        assert!(!view.is_loading());
        assert!(view.items().is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn switching_identity_clears_before_new_push() {
        let store = ScriptedStore::default();
        let mut view: CollectionView<_, Events> = CollectionView::new(store.clone());
        let mut rx = view.watch();

        view.set_scope(Some(Scope::new("a", "Ana")));
        store.push(vec![event_doc("e1", "a")]);
        rx.wait_for(|s| s.items.len() == 1).await.unwrap();

        view.set_scope(Some(Scope::new("b", "Luis")));
        let state = view.state();
        assert!(state.items.is_empty());
        assert!(state.is_loading);
        assert_eq!(state.phase, Phase::Subscribing);
        assert_eq!(view.scope().unwrap().owner_id, "b");

        store.push(vec![event_doc("e2", "b")]);
        rx.wait_for(|s| s.phase == Phase::Live).await.unwrap();
        let ids: Vec<_> = view.items().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["e2"]);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.open_subscriptions(), 1);
    }

    #[tokio::test]
    async fn same_owner_is_a_no_op() {
        let store = ScriptedStore::default();
        let mut view: CollectionView<_, Events> = CollectionView::new(store.clone());

        view.set_scope(Some(Scope::new("a", "Ana")));
        view.set_scope(Some(Scope::new("a", "Ana")));
        assert_eq!(store.calls(), ["subscribe events"]);
    }

    #[tokio::test]
    async fn renamed_owner_keeps_subscription_and_stamps_new_name() {
        let store = ScriptedStore::default();
        let mut view: CollectionView<_, Events> = CollectionView::new(store.clone());

        view.set_scope(Some(Scope::new("a", "Ana")));
        view.set_scope(Some(Scope::new("a", "Ana María")));
        assert_eq!(store.calls(), ["subscribe events"]);
        assert_eq!(view.scope().unwrap().owner_name, "Ana María");

        let t0 = Utc.with_ymd_and_hms(2026, 3, 20, 15, 0, 0).unwrap();
        view.create(&EventDraft::new("Doctor", t0, t0 + Duration::hours(1)))
            .await
            .unwrap();
        let write = store.last_write().unwrap();
        assert_eq!(write.fields["ownerName"], json!("Ana María"));
    }

    #[tokio::test]
    async fn clearing_identity_tears_down() {
        let store = ScriptedStore::default();
        let mut view: CollectionView<_, Events> = CollectionView::new(store.clone());
        let mut rx = view.watch();

        view.set_scope(Some(Scope::new("a", "Ana")));
        store.push(vec![event_doc("e1", "a")]);
        rx.wait_for(|s| s.phase == Phase::Live).await.unwrap();

        view.follow_identity(None);
        assert_eq!(view.phase(), Phase::Idle);
        assert!(view.items().is_empty());
        let event = CalendarEvent::from_document(&event_doc("e1", "a")).unwrap();
        assert!(!view.can_edit(&event));
    }

    #[tokio::test]
    async fn follows_identity_provider_changes() {
        let store = ScriptedStore::default();
        let provider = IdentityProvider::in_memory();
        let mut identity = provider.subscribe();
        let mut view: CollectionView<_, Events> = CollectionView::new(store.clone());

        provider.select(Identity::new("a", "Ana")).unwrap();
        assert!(view.next_identity(&mut identity).await);
        assert_eq!(view.scope().unwrap().owner_id, "a");
        assert_eq!(view.phase(), Phase::Subscribing);

        provider.change().unwrap();
        assert!(view.next_identity(&mut identity).await);
        assert_eq!(view.phase(), Phase::Idle);

        drop(provider);
        assert!(!view.next_identity(&mut identity).await);
    }

    #[tokio::test]
    async fn unscoped_view_mounts_and_unmounts() {
        let store = ScriptedStore::default();
        let mut view: CollectionView<_, Shifts> = CollectionView::new(store.clone());
        let mut rx = view.watch();

        view.mount();
        view.mount();
        store.push(vec![shift_doc("s1", "D1")]);
        rx.wait_for(|s| s.phase == Phase::Live).await.unwrap();
        assert_eq!(store.calls(), ["subscribe shifts"]);

        view.unmount();
        assert_eq!(view.phase(), Phase::Closed);
        assert_eq!(view.items().len(), 1);
    }

    #[tokio::test]
    async fn dropping_the_view_closes_the_subscription() {
        let store = ScriptedStore::default();
        let mut view: CollectionView<_, Shifts> = CollectionView::new(store.clone());
        view.mount();
        drop(view);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(store.open_subscriptions(), 0);
    }
}
