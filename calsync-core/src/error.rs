//! Error types for the calsync ecosystem.

use thiserror::Error;

use crate::remote::StoreError;

/// Errors that can occur in calsync operations.
#[derive(Error, Debug)]
pub enum CalSyncError {
    /// A mutation was attempted on an identity-scoped collection with no
    /// current identity. Raised before any store call.
    #[error("No user selected")]
    NotAuthenticated,

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    /// A create/update/delete round-trip failed. `message` is the short,
    /// user-facing text; the store's own error is kept as the source.
    #[error("{message}")]
    StoreWriteFailed {
        message: String,
        #[source]
        source: StoreError,
    },

    #[error("Malformed {collection} record '{id}': {reason}")]
    MalformedSnapshotItem {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for calsync operations.
pub type CalSyncResult<T> = Result<T, CalSyncError>;
