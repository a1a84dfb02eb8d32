//! The sync layer: one generic engine mirroring a remote collection, its two
//! instantiations, and the adapter presentation code holds on to.

mod collection;
mod engine;
mod events;
mod shifts;
mod view;

#[cfg(test)]
mod testing;

pub use collection::{Collection, Messages, Scope};
pub use engine::{Phase, SyncEngine, SyncState};
pub use events::{EventSync, Events};
pub use shifts::{ShiftSync, Shifts};
pub use view::CollectionView;
