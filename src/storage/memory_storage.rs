use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
};

use anyhow::Result;

use super::{Storage, StorageError};

/// Process-local storage. Clones share the same data.
///
/// A quota (bytes of key plus value, summed over all entries) and an
/// enabled switch let callers reproduce the two ways a browser's local
/// storage refuses writes: a full quota and storage disabled outright.
#[derive(Clone)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    quota_bytes: Option<usize>,
    enabled: Arc<AtomicBool>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Disabled storage fails every operation with [`StorageError::Disabled`].
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Bytes currently counted against the quota.
    pub fn usage(&self) -> Result<usize> {
        let data = self
            .data
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire read lock"))?;
        Ok(data.iter().map(|(k, v)| k.len() + v.len()).sum())
    }

    fn check_enabled(&self) -> Result<()> {
        if self.enabled.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Disabled.into())
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            quota_bytes: None,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl Storage for InMemoryStorage {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        log::debug!("STORAGE LIST: prefix='{}'", prefix);
        self.check_enabled()?;
        let data = self
            .data
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire read lock"))?;
        let mut results: Vec<String> = data
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        results.sort();
        log::debug!("STORAGE LIST RESULT: {} items", results.len());
        Ok(results)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        log::debug!("STORAGE GET: key='{}'", key);
        self.check_enabled()?;
        let data = self
            .data
            .read()
            .map_err(|_| anyhow::anyhow!("Failed to acquire read lock"))?;
        let content = data.get(key).cloned();
        match &content {
            Some(bytes) => log::debug!("STORAGE GET RESULT: {} bytes", bytes.len()),
            None => log::debug!("STORAGE GET RESULT: not found"),
        }
        Ok(content)
    }

    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        log::debug!("STORAGE PUT: key='{}', size={} bytes", key, content.len());
        self.check_enabled()?;
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire write lock"))?;

        if let Some(quota) = self.quota_bytes {
            let others: usize = data
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + content.len();
            let available = quota.saturating_sub(others);
            if needed > available {
                log::debug!("STORAGE PUT RESULT: quota exceeded");
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                }
                .into());
            }
        }

        data.insert(key.to_string(), content.to_vec());
        log::debug!("STORAGE PUT RESULT: success");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        log::debug!("STORAGE REMOVE: key='{}'", key);
        self.check_enabled()?;
        let mut data = self
            .data
            .write()
            .map_err(|_| anyhow::anyhow!("Failed to acquire write lock"))?;
        data.remove(key);
        Ok(())
    }
}
