//! Core of calsync: a shared family calendar and a shift catalog, kept in
//! sync with a remote collection store.
//!
//! - `remote`: the store capability and an in-process implementation
//! - `sync`: the collection sync engine and the view adapter over it
//! - `event` / `shift`: the synced entities
//! - `identity`: who is using the app, and where that choice is kept

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod identity;
pub mod remote;
pub mod shift;
pub mod sync;
pub mod timestamp;

pub use error::{CalSyncError, CalSyncResult};
pub use event::{CalendarEvent, EventCategory, EventDraft, EventPatch};
pub use identity::{Identity, IdentityProvider, IdentityStore};
pub use shift::{Shift, ShiftDraft, ShiftPatch};
