//! The current user: who is picked, where that choice is remembered, and how
//! the rest of the process hears about a change.
//!
//! There is no authentication here. A user is selected from a roster and the
//! selection is persisted to a small JSON file so the next run starts with the
//! same user.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{CalSyncError, CalSyncResult};
use crate::sync::Scope;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Identity {
            id: id.into(),
            email: None,
            display_name: Some(display_name.into()),
            avatar_url: None,
        }
    }

    /// Name shown next to authored events. Falls back to "User".
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.id.clone(), self.name())
    }
}

/// File-backed memory of the selected identity.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        IdentityStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the remembered identity.
    ///
    /// A file that does not parse is deleted and treated as "nobody selected".
    pub fn load(&self) -> CalSyncResult<Option<Identity>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Identity>(&content) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt identity file");
                std::fs::remove_file(&self.path)?;
                Ok(None)
            }
        }
    }

    pub fn select(&self, identity: &Identity) -> CalSyncResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(identity)
            .map_err(|e| CalSyncError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn clear(&self) -> CalSyncResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Holds the one current identity and notifies subscribers when it changes.
///
/// Passed explicitly to whoever needs it. Sync engines never read it
/// themselves; they are handed a [`Scope`] derived from it.
pub struct IdentityProvider {
    current: watch::Sender<Option<Identity>>,
    store: Option<IdentityStore>,
}

impl IdentityProvider {
    /// A provider that forgets its selection when the process exits.
    pub fn in_memory() -> Self {
        let (current, _) = watch::channel(None);
        IdentityProvider {
            current,
            store: None,
        }
    }

    /// A provider that starts from, and writes through to, `store`.
    pub fn persisted(store: IdentityStore) -> CalSyncResult<Self> {
        let initial = store.load()?;
        let (current, _) = watch::channel(initial);
        Ok(IdentityProvider {
            current,
            store: Some(store),
        })
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn is_selected(&self) -> bool {
        self.current.borrow().is_some()
    }

    pub fn select(&self, identity: Identity) -> CalSyncResult<()> {
        if let Some(store) = &self.store {
            store.select(&identity)?;
        }
        tracing::debug!(user = %identity.id, "identity selected");
        self.current.send_replace(Some(identity));
        Ok(())
    }

    /// Forget the current identity.
    pub fn change(&self) -> CalSyncResult<()> {
        if let Some(store) = &self.store {
            store.clear()?;
        }
        tracing::debug!("identity cleared");
        self.current.send_replace(None);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}
