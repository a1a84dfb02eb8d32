use crate::constants::CREATED_AT;
use crate::error::CalSyncResult;
use crate::remote::{Document, OrderBy, Record};

/// Who a scoped collection is being synced for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub owner_id: String,
    pub owner_name: String,
}

impl Scope {
    pub fn new(owner_id: impl Into<String>, owner_name: impl Into<String>) -> Self {
        Scope {
            owner_id: owner_id.into(),
            owner_name: owner_name.into(),
        }
    }
}

/// User-facing messages for a collection's failures.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub load: &'static str,
    pub create: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
}

/// Describes one logical collection to a [`SyncEngine`](super::SyncEngine):
/// its name in the store, how records decode into items, and how drafts and
/// patches encode into records.
pub trait Collection: Send + Sync + 'static {
    const NAME: &'static str;

    /// Whether the collection is only active, and only writable, while a
    /// [`Scope`] is present.
    const SCOPED: bool;

    type Item: Clone + Send + Sync + 'static;
    type Draft: Send + Sync;
    type Patch: Send + Sync;

    const MESSAGES: Messages;

    /// Order requested from the store. Newest first.
    fn order() -> OrderBy {
        OrderBy::desc(CREATED_AT)
    }

    /// Decode one pushed record, defaulting what can be defaulted.
    /// `Err(reason)` skips the record.
    fn decode(doc: &Document) -> Result<Self::Item, String>;

    fn encode_draft(draft: &Self::Draft, scope: Option<&Scope>) -> CalSyncResult<Record>;

    fn encode_patch(patch: &Self::Patch) -> CalSyncResult<Record>;
}
