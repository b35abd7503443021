use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

use anyhow::Result;

use super::{Storage, StorageError};

const TMP_SUFFIX: &str = ".tmp";

/// One file per key under a base directory. Keys containing `/` become
/// nested directories, so a namespaced key like `user-1/children` lands in
/// `{base}/user-1/children`.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && !key.ends_with(TMP_SUFFIX)
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()).into());
        }
        Ok(self.base_path.join(relative))
    }

    fn collect_keys(&self, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.collect_keys(&path, keys)?;
                continue;
            }
            let Ok(relative) = path.strip_prefix(&self.base_path) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if !key.ends_with(TMP_SUFFIX) {
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl Storage for LocalStorage {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        log::debug!("STORAGE LIST: prefix='{}'", prefix);
        if !self.base_path.exists() {
            log::debug!("STORAGE LIST RESULT: 0 items (base path does not exist)");
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        self.collect_keys(&self.base_path, &mut keys)?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();

        log::debug!("STORAGE LIST RESULT: {} items", keys.len());
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        log::debug!("STORAGE GET: key='{}'", key);
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(content) => {
                log::debug!("STORAGE GET RESULT: {} bytes", content.len());
                Ok(Some(content))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("STORAGE GET RESULT: not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        log::debug!("STORAGE PUT: key='{}', size={} bytes", key, content.len());
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Write beside the target and rename so a reader never sees half a file.
        let mut tmp = path.clone().into_os_string();
        tmp.push(TMP_SUFFIX);
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        log::debug!("STORAGE PUT RESULT: success");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        log::debug!("STORAGE REMOVE: key='{}'", key);
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing_key() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path());

        assert_eq!(storage.get("children")?, None);
        Ok(())
    }

    #[test]
    fn test_put_overwrites() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path());

        storage.put("children", b"[1,2,3]")?;
        storage.put("children", b"[]")?;
        assert_eq!(storage.get("children")?, Some(b"[]".to_vec()));
        assert!(!temp_dir.path().join("children.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_list_with_nested_keys() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path());

        storage.put("user-1/children", b"a")?;
        storage.put("user-1/events", b"b")?;
        storage.put("user-2/children", b"c")?;
        storage.put("favoriteTips", b"d")?;

        let keys = storage.list("user-1/")?;
        assert_eq!(keys, vec!["user-1/children", "user-1/events"]);

        let all = storage.list("")?;
        assert_eq!(all.len(), 4);
        Ok(())
    }

    #[test]
    fn test_list_with_non_existent_base() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path().join("not-yet-created"));

        assert!(storage.list("")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejects_escaping_keys() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path());

        for key in ["", "../children", "/etc/passwd", "a/../../b", "children.tmp"] {
            let err = storage.put(key, b"x").unwrap_err();
            assert!(matches!(
                err.downcast_ref::<StorageError>(),
                Some(StorageError::InvalidKey(_))
            ));
        }
        Ok(())
    }

    #[test]
    fn test_remove_is_idempotent() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = LocalStorage::new(temp_dir.path());

        storage.put("events", b"[]")?;
        storage.remove("events")?;
        storage.remove("events")?;
        assert_eq!(storage.get("events")?, None);
        Ok(())
    }
}
