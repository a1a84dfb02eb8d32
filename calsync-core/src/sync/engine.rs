//! Collection sync engine.
//!
//! Mirrors one remote collection into a local materialized list. Every push
//! from the store replaces the list wholesale; writes go to the store and
//! only show up locally once the store pushes them back.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use super::collection::{Collection, Scope};
use crate::constants::{CREATED_AT, UPDATED_AT};
use crate::error::{CalSyncError, CalSyncResult};
use crate::remote::{Document, Push, RemoteStore, StoreError, Subscription, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No subscription; nothing to show.
    Idle,
    /// Subscription requested, first snapshot not yet received.
    Subscribing,
    /// Showing the latest snapshot.
    Live,
    /// The subscription reported a failure, or a write failed while live.
    /// Items are the last good snapshot; the next push returns to `Live`.
    Errored,
    /// Torn down. Late pushes are discarded.
    Closed,
}

/// What presentation code reads.
#[derive(Debug, Clone)]
pub struct SyncState<T> {
    pub items: Vec<T>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub phase: Phase,
    /// Bumped on every start/stop; a pump only applies pushes while its own
    /// generation is current.
    generation: u64,
}

impl<T> SyncState<T> {
    fn idle() -> Self {
        SyncState {
            items: Vec::new(),
            is_loading: false,
            error: None,
            phase: Phase::Idle,
            generation: 0,
        }
    }
}

pub struct SyncEngine<S: RemoteStore, C: Collection> {
    store: S,
    scope: Option<Scope>,
    state: Arc<watch::Sender<SyncState<C::Item>>>,
    stop_signal: Option<oneshot::Sender<()>>,
    _collection: PhantomData<fn() -> C>,
}

impl<S: RemoteStore, C: Collection> SyncEngine<S, C> {
    /// An idle engine. Call [`start`](Self::start) to begin syncing.
    pub fn new(store: S, scope: Option<Scope>) -> Self {
        let (state, _) = watch::channel(SyncState::idle());
        SyncEngine {
            store,
            scope,
            state: Arc::new(state),
            stop_signal: None,
            _collection: PhantomData,
        }
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    /// Replace the scope. Takes effect on the next `start`.
    pub(crate) fn set_scope(&mut self, scope: Option<Scope>) {
        self.scope = scope;
    }

    /// Whether a subscription is currently open.
    pub fn is_active(&self) -> bool {
        self.stop_signal.is_some()
    }

    pub fn state(&self) -> SyncState<C::Item> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<C::Item> {
        self.state.borrow().items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    /// Change notifications for the state.
    pub fn watch(&self) -> watch::Receiver<SyncState<C::Item>> {
        self.state.subscribe()
    }

    /// Open the subscription and start applying pushes.
    ///
    /// Must be called inside a tokio runtime. A scoped collection without a
    /// scope stays idle. Starting an active engine restarts it.
    pub fn start(&mut self) {
        if self.is_active() {
            self.stop();
        }

        if C::SCOPED && self.scope.is_none() {
            debug!(collection = C::NAME, "no scope, staying idle");
            self.state.send_modify(|s| {
                s.generation += 1;
                s.items.clear();
                s.is_loading = false;
                s.error = None;
                s.phase = Phase::Idle;
            });
            return;
        }

        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.is_loading = true;
            s.phase = Phase::Subscribing;
        });

        debug!(collection = C::NAME, generation, "opening subscription");
        let subscription = self.store.subscribe(C::NAME, &C::order());
        let (stop_tx, stop_rx) = oneshot::channel();
        tokio::spawn(pump::<C>(
            subscription,
            stop_rx,
            Arc::clone(&self.state),
            generation,
        ));
        self.stop_signal = Some(stop_tx);
    }

    /// Close the subscription. Idempotent. Items are kept as they were.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop_signal.take() {
            debug!(collection = C::NAME, "closing subscription");
            let _ = stop.send(());
        }

        self.state.send_if_modified(|s| {
            s.generation += 1;
            if s.phase == Phase::Closed && !s.is_loading {
                return false;
            }
            s.is_loading = false;
            s.phase = Phase::Closed;
            true
        });
    }

    /// Stop and forget everything: empty list, no error, Idle.
    pub fn reset(&mut self) {
        self.stop();
        self.state.send_modify(|s| {
            s.items.clear();
            s.error = None;
            s.phase = Phase::Idle;
        });
    }

    /// Wait until the engine is no longer loading. Fails with
    /// `SubscriptionFailed` if it settled in the errored phase.
    pub async fn loaded(&self) -> CalSyncResult<()> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|s| !s.is_loading)
            .await
            .map_err(|_| CalSyncError::SubscriptionFailed("state channel closed".into()))?;

        match state.phase {
            Phase::Errored => Err(CalSyncError::SubscriptionFailed(
                state.error.clone().unwrap_or_default(),
            )),
            _ => Ok(()),
        }
    }

    /// Create a record. Returns the store-assigned id.
    ///
    /// The local list is not touched; the new item arrives with the next push.
    pub async fn create(&self, draft: &C::Draft) -> CalSyncResult<String> {
        let scope = self.require_scope()?;
        let fields = C::encode_draft(draft, scope)?;
        self.clear_error();

        let write = Write::new(fields).stamp(CREATED_AT).stamp(UPDATED_AT);
        match self.store.insert(C::NAME, write).await {
            Ok(id) => {
                info!(collection = C::NAME, %id, "created");
                Ok(id)
            }
            Err(e) => Err(self.write_failed(C::MESSAGES.create, e)),
        }
    }

    /// Merge `patch` into record `id` and refresh its update stamp.
    ///
    /// Ownership is not checked here. For owner-scoped collections the
    /// caller must confirm permission first (store-side rules are the
    /// authority; this layer does not duplicate them).
    pub async fn update(&self, id: &str, patch: &C::Patch) -> CalSyncResult<()> {
        self.require_scope()?;
        let fields = C::encode_patch(patch)?;
        self.clear_error();

        let write = Write::new(fields).stamp(UPDATED_AT);
        match self.store.patch(C::NAME, id, write).await {
            Ok(()) => {
                info!(collection = C::NAME, %id, "updated");
                Ok(())
            }
            Err(e) => Err(self.write_failed(C::MESSAGES.update, e)),
        }
    }

    pub async fn delete(&self, id: &str) -> CalSyncResult<()> {
        self.require_scope()?;
        self.clear_error();

        match self.store.remove(C::NAME, id).await {
            Ok(()) => {
                info!(collection = C::NAME, %id, "deleted");
                Ok(())
            }
            Err(e) => Err(self.write_failed(C::MESSAGES.delete, e)),
        }
    }

    fn require_scope(&self) -> CalSyncResult<Option<&Scope>> {
        if C::SCOPED && self.scope.is_none() {
            return Err(CalSyncError::NotAuthenticated);
        }
        Ok(self.scope.as_ref())
    }

    fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    fn write_failed(&self, message: &str, source: StoreError) -> CalSyncError {
        error!(collection = C::NAME, error = %source, "{}", message);
        self.state.send_modify(|s| {
            s.error = Some(message.to_string());
            if s.phase == Phase::Live {
                s.phase = Phase::Errored;
            }
        });
        CalSyncError::StoreWriteFailed {
            message: message.to_string(),
            source,
        }
    }
}

impl<S: RemoteStore, C: Collection> Drop for SyncEngine<S, C> {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn pump<C: Collection>(
    mut subscription: Subscription,
    mut stop: oneshot::Receiver<()>,
    state: Arc<watch::Sender<SyncState<C::Item>>>,
    generation: u64,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            push = subscription.next() => match push {
                Some(push) => apply::<C>(&state, generation, push),
                None => break,
            },
        }
    }
    subscription.close();
    debug!(collection = C::NAME, generation, "subscription closed");
}

fn apply<C: Collection>(
    state: &watch::Sender<SyncState<C::Item>>,
    generation: u64,
    push: Push,
) {
    state.send_if_modified(|s| {
        if s.generation != generation {
            warn!(collection = C::NAME, "discarding push from a closed subscription");
            return false;
        }

        match push {
            Ok(docs) => {
                s.items = decode_snapshot::<C>(&docs);
                s.is_loading = false;
                s.error = None;
                s.phase = Phase::Live;
                debug!(collection = C::NAME, items = s.items.len(), "snapshot applied");
            }
            Err(message) => {
                let failure = CalSyncError::SubscriptionFailed(message);
                error!(collection = C::NAME, error = %failure, "subscription error");
                s.error = Some(C::MESSAGES.load.to_string());
                s.is_loading = false;
                s.phase = Phase::Errored;
            }
        }
        true
    });
}

/// Decode a snapshot, skipping records that cannot be salvaged.
fn decode_snapshot<C: Collection>(docs: &[Document]) -> Vec<C::Item> {
    docs.iter()
        .filter_map(|doc| match C::decode(doc) {
            Ok(item) => Some(item),
            Err(reason) => {
                let skipped = CalSyncError::MalformedSnapshotItem {
                    collection: C::NAME.to_string(),
                    id: doc.id.clone(),
                    reason,
                };
                warn!("{skipped}, skipping");
                None
            }
        })
        .collect()
}
