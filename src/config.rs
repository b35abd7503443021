//! Tracker configuration, usually read from a TOML file.
//!
//! ```toml
//! namespace = "user-42"
//! passphrase = "correct horse"
//! seed_samples = false
//!
//! [backend]
//! kind = "sqlite"
//! path = "/var/lib/cradle/tracker.db"
//! ```

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::storage::{ArcStorage, EncryptedStorage, InMemoryStorage, LocalStorage, SqliteStorage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    #[default]
    Memory,
    /// One file per key below `path`.
    Directory { path: PathBuf },
    Sqlite { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Prefix for every key, typically the signed in user's id.
    pub namespace: Option<String>,
    pub backend: BackendConfig,
    /// Encrypts every stored value when set.
    pub passphrase: Option<String>,
    /// Show sample children until the first child is saved.
    pub seed_samples: bool,
    /// Only honoured by the memory backend.
    pub memory_quota_bytes: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            backend: BackendConfig::Memory,
            passphrase: None,
            seed_samples: true,
            memory_quota_bytes: None,
        }
    }
}

impl TrackerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TrackerConfig =
            toml::from_str(content).with_context(|| "Failed to parse tracker config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read tracker config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.passphrase.as_deref().is_some_and(str::is_empty) {
            return Err(anyhow::anyhow!("Passphrase must not be empty when set"));
        }
        if self.memory_quota_bytes.is_some() && self.backend != BackendConfig::Memory {
            return Err(anyhow::anyhow!(
                "memory_quota_bytes only applies to the memory backend"
            ));
        }
        Ok(())
    }

    /// Opens the configured backend, wrapped in encryption if a passphrase is set.
    pub fn open_storage(&self) -> Result<ArcStorage> {
        self.validate()?;
        let storage = match &self.backend {
            BackendConfig::Memory => match self.memory_quota_bytes {
                Some(quota) => ArcStorage::from_storage(InMemoryStorage::with_quota(quota)),
                None => ArcStorage::from_storage(InMemoryStorage::new()),
            },
            BackendConfig::Directory { path } => {
                fs::create_dir_all(path)
                    .with_context(|| format!("Failed to create storage directory: {:?}", path))?;
                ArcStorage::from_storage(LocalStorage::new(path))
            }
            BackendConfig::Sqlite { path } => ArcStorage::from_storage(SqliteStorage::open(path)?),
        };
        log::info!("Opened {:?} storage", self.backend);

        Ok(match &self.passphrase {
            Some(passphrase) => {
                ArcStorage::from_storage(EncryptedStorage::new(storage, passphrase.clone()))
            }
            None => storage,
        })
    }
}
