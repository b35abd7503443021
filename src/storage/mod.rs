//! Durable string-keyed byte storage that collections are persisted into.
//!
//! Every backend stores an opaque byte value per key and overwrites it in full
//! on `put`. Reading a key that was never written is not an error, it is
//! `Ok(None)`. Backends report failures as `anyhow::Error`; the conditions a
//! caller may want to react to (quota, disabled medium, bad key) are carried
//! as a [`StorageError`] inside it.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

mod encrypted_storage;
mod local_storage;
mod memory_storage;
mod sqlite_storage;

pub use encrypted_storage::EncryptedStorage;
pub use local_storage::LocalStorage;
pub use memory_storage::InMemoryStorage;
pub use sqlite_storage::SqliteStorage;

pub trait Storage: Send + Sync {
    /// Keys starting with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, content: &[u8]) -> Result<()>;
    /// Removing a missing key is a no-op.
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing '{key}': {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("storage is disabled")]
    Disabled,

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

// Storage wrapper to allow Arc<dyn Storage> to be cloned and passed around as a Storage
#[derive(Clone)]
pub struct ArcStorage {
    inner: Arc<dyn Storage>,
}

impl ArcStorage {
    pub fn new(target: Arc<dyn Storage>) -> Self {
        Self { inner: target }
    }

    pub fn from_storage<S: Storage + 'static>(storage: S) -> Self {
        Self::new(Arc::new(storage))
    }
}

impl Storage for ArcStorage {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.list(prefix)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        self.inner.put(key, content)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}
