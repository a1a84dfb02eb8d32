//! Everything a command needs: configuration, the store and the current user.

use anyhow::{Context, Result};
use calsync_core::config::CalSyncConfig;
use calsync_core::remote::MemoryStore;
use calsync_core::sync::{Collection, CollectionView, Events, Shifts};
use calsync_core::{Identity, IdentityProvider, IdentityStore};

use crate::utils::tui::spin_while;

pub struct App {
    pub config: CalSyncConfig,
    pub store: MemoryStore,
    pub identity: IdentityProvider,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = CalSyncConfig::load()?;

        let data_path = config.data_path();
        let store = MemoryStore::open(&data_path)
            .with_context(|| format!("Failed to open store at {}", data_path.display()))?;

        let identity_store = IdentityStore::new(config.identity_path()?);
        let identity = IdentityProvider::persisted(identity_store)?;
        tracing::debug!(
            data = %data_path.display(),
            user = ?identity.current().map(|i| i.id),
            "loaded app state"
        );

        Ok(App {
            config,
            store,
            identity,
        })
    }

    pub fn require_identity(&self) -> Result<Identity> {
        match self.identity.current() {
            Some(identity) => Ok(identity),
            None => anyhow::bail!(
                "No user selected.\n\n\
                Pick one with:\n  \
                calsync user select"
            ),
        }
    }

    /// Events view for the current user, with the first snapshot loaded.
    pub async fn events(&self) -> Result<CollectionView<MemoryStore, Events>> {
        let identity = self.require_identity()?;
        let mut view = CollectionView::new(self.store.clone());
        view.follow_identity(Some(&identity));
        wait_loaded(&view).await?;
        Ok(view)
    }

    /// Shift catalog view, with the first snapshot loaded.
    pub async fn shifts(&self) -> Result<CollectionView<MemoryStore, Shifts>> {
        let mut view = CollectionView::new(self.store.clone());
        view.mount();
        wait_loaded(&view).await?;
        Ok(view)
    }
}

async fn wait_loaded<C: Collection>(view: &CollectionView<MemoryStore, C>) -> Result<()> {
    spin_while(format!("Loading {}", C::NAME), view.loaded())
        .await
        .with_context(|| format!("Failed to load {}", C::NAME))
}
