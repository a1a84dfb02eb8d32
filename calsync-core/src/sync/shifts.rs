//! The shifts collection: a global catalog any identity may edit.

use super::collection::{Collection, Messages, Scope};
use super::engine::SyncEngine;
use crate::error::CalSyncResult;
use crate::remote::{Document, Record, RemoteStore};
use crate::shift::{self, Shift, ShiftDraft, ShiftPatch};

pub struct Shifts;

impl Collection for Shifts {
    const NAME: &'static str = "shifts";
    const SCOPED: bool = false;

    type Item = Shift;
    type Draft = ShiftDraft;
    type Patch = ShiftPatch;

    const MESSAGES: Messages = Messages {
        load: "Could not load shifts",
        create: "Could not create the shift. Please try again.",
        update: "Could not update the shift. Please try again.",
        delete: "Could not delete the shift. Please try again.",
    };

    fn decode(doc: &Document) -> Result<Shift, String> {
        Shift::from_document(doc)
    }

    fn encode_draft(draft: &ShiftDraft, _scope: Option<&Scope>) -> CalSyncResult<Record> {
        Ok(draft.to_record())
    }

    fn encode_patch(patch: &ShiftPatch) -> CalSyncResult<Record> {
        Ok(patch.to_record())
    }
}

pub type ShiftSync<S> = SyncEngine<S, Shifts>;

impl<S: RemoteStore> SyncEngine<S, Shifts> {
    /// Create every shift of the built-in catalog, in order. Stops at the
    /// first failure; shifts created before it stay. Returns how many were
    /// created.
    pub async fn import_defaults(&self) -> CalSyncResult<usize> {
        let catalog = shift::default_catalog();
        for draft in &catalog {
            self.create(draft).await?;
        }
        tracing::info!(count = catalog.len(), "imported default shifts");
        Ok(catalog.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalSyncError;
    use crate::remote::{MemoryStore, StoreError};
    use crate::sync::testing::ScriptedStore;

    #[tokio::test]
    async fn shift_without_text_size_materializes_with_default() {
        let store = MemoryStore::new();
        let mut shifts: ShiftSync<_> = SyncEngine::new(store, None);
        let mut rx = shifts.watch();
        shifts.start();
        shifts.loaded().await.unwrap();

        shifts
            .create(&ShiftDraft::new("Guardia", "G").colors("#FF6347", "#FFFFFF"))
            .await
            .unwrap();
        rx.wait_for(|s| s.items.len() == 1).await.unwrap();

        let guardia = &shifts.items()[0];
        assert_eq!(guardia.text_size, 12);
        assert_eq!(guardia.background_color, "#FF6347");
        assert_eq!(guardia.time_range_label(), "");
    }

    #[tokio::test]
    async fn newest_shift_comes_first() {
        let store = MemoryStore::new();
        let mut shifts: ShiftSync<_> = SyncEngine::new(store, None);
        let mut rx = shifts.watch();
        shifts.start();

        shifts.create(&ShiftDraft::new("Mañana", "M")).await.unwrap();
        rx.wait_for(|s| s.items.len() == 1).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        shifts.create(&ShiftDraft::new("Noche", "N")).await.unwrap();
        rx.wait_for(|s| s.items.len() == 2).await.unwrap();

        let names: Vec<_> = shifts.items().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["Noche", "Mañana"]);
    }

    #[tokio::test]
    async fn shifts_need_no_scope() {
        let store = ScriptedStore::default();
        let mut shifts: ShiftSync<_> = SyncEngine::new(store.clone(), None);
        shifts.start();

        shifts.create(&ShiftDraft::new("D1", "D1")).await.unwrap();
        shifts.delete("id-1").await.unwrap();
        assert_eq!(store.calls(), ["subscribe shifts", "insert shifts", "remove shifts id-1"]);
    }

    #[tokio::test]
    async fn import_defaults_creates_catalog_in_order() {
        let store = MemoryStore::new();
        let mut shifts: ShiftSync<_> = SyncEngine::new(store.clone(), None);
        let mut rx = shifts.watch();
        shifts.start();

        assert_eq!(shifts.import_defaults().await.unwrap(), 7);
        rx.wait_for(|s| s.items.len() == 7).await.unwrap();

        let stored: Vec<_> = store
            .documents(Shifts::NAME)
            .iter()
            .map(|d| d.get_str("name").unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            stored,
            ["Nuevo", "S. Santa", "Feria", "Descanso", "D1", "D2", "Tarde"]
        );

        let d1 = shifts.items().into_iter().find(|s| s.name == "D1").unwrap();
        assert_eq!(d1.time_range_label(), "(08:00-20:00)");
    }

    #[tokio::test]
    async fn import_defaults_stops_at_first_failure() {
        let store = ScriptedStore::default();
        let shifts: ShiftSync<_> = SyncEngine::new(store.clone(), None);
        store.fail_writes(StoreError::PermissionDenied);

        let err = shifts.import_defaults().await.unwrap_err();
        assert!(matches!(err, CalSyncError::StoreWriteFailed { .. }));
        assert_eq!(store.calls().len(), 1);
    }
}
