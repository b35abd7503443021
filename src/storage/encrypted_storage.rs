use std::sync::{Arc, Mutex};

use age::secrecy::SecretString;
use anyhow::Result;

use super::{ArcStorage, Storage};

type Keys = (age::scrypt::Recipient, age::scrypt::Identity);

/// EncryptedStorage encrypts values with age using a passphrase-derived key.
///
/// Keys are stored in plaintext. They only name collections (`children`,
/// `events`, ...), while the values hold the names, dates and photos.
#[derive(Clone)]
pub struct EncryptedStorage {
    inner: ArcStorage,
    passphrase: String,
    // Lazily initialized and cached, scrypt setup is not free
    cached_keys: Arc<Mutex<Option<Keys>>>,
}

impl EncryptedStorage {
    pub fn new(inner: ArcStorage, passphrase: String) -> Self {
        Self {
            inner,
            passphrase,
            cached_keys: Arc::new(Mutex::new(None)),
        }
    }

    fn with_keys<R>(&self, f: impl FnOnce(&Keys) -> Result<R>) -> Result<R> {
        let mut keys_guard = self
            .cached_keys
            .lock()
            .map_err(|_| anyhow::anyhow!("Failed to acquire keys lock"))?;
        let keys = keys_guard.get_or_insert_with(|| {
            let secret = SecretString::from(self.passphrase.clone());
            let recipient = age::scrypt::Recipient::new(secret.clone());
            let identity = age::scrypt::Identity::new(secret);
            (recipient, identity)
        });
        f(keys)
    }

    fn encrypt_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.with_keys(|(recipient, _)| Ok(age::encrypt(recipient, data)?))
    }

    fn decrypt_bytes(&self, encrypted: &[u8]) -> Result<Vec<u8>> {
        self.with_keys(|(_, identity)| Ok(age::decrypt(identity, encrypted)?))
    }
}

impl Storage for EncryptedStorage {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        log::debug!("ENCRYPTED STORAGE LIST: prefix='{}'", prefix);
        self.inner.list(prefix)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        log::debug!("ENCRYPTED STORAGE GET: key='{}'", key);
        let Some(encrypted) = self.inner.get(key)? else {
            return Ok(None);
        };
        let decrypted = self.decrypt_bytes(&encrypted)?;
        log::debug!("ENCRYPTED STORAGE GET RESULT: {} bytes", decrypted.len());
        Ok(Some(decrypted))
    }

    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        log::debug!("ENCRYPTED STORAGE PUT: key='{}', size={} bytes", key, content.len());
        let encrypted = self.encrypt_bytes(content)?;
        self.inner.put(key, &encrypted)?;
        log::debug!("ENCRYPTED STORAGE PUT RESULT: success");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}
