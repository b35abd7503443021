use thiserror::Error;

use crate::storage::StorageError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend refused the read or write (quota, disabled medium, I/O).
    #[error("storage unavailable for '{key}': {source}")]
    StorageUnavailable { key: String, source: anyhow::Error },

    #[error("failed to encode record for '{key}'")]
    Encode {
        key: String,
        source: serde_json::Error,
    },

    #[error("record '{id}' in '{key}' cannot be decoded")]
    Decode {
        key: String,
        id: String,
        source: serde_json::Error,
    },

    #[error("patch for record '{id}' in '{key}' does not produce a valid record")]
    InvalidPatch {
        key: String,
        id: String,
        source: serde_json::Error,
    },

    #[error("'{key}' was written with schema version {found}, newest supported is {supported}")]
    UnsupportedSchemaVersion { key: String, found: u32, supported: u32 },
}

impl StoreError {
    /// The typed backend condition behind a `StorageUnavailable`, if any.
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            StoreError::StorageUnavailable { source, .. } => source.downcast_ref::<StorageError>(),
            _ => None,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self.storage_error(), Some(StorageError::QuotaExceeded { .. }))
    }
}
