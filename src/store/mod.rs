//! The entity store: named collections of JSON records over a [`Storage`].
//!
//! Every collection lives under one key and is rewritten in full on every
//! change. Reads never fail for expected conditions: a missing key is an
//! empty collection, an unreadable payload is logged and treated as empty,
//! and a record that does not decode is dropped from the result while the
//! rest of the collection is returned. Only the backend itself failing, or
//! data written by a newer schema, is an error. Data written by a newer
//! schema is never overwritten either.
//!
//! The compound helpers (`append`, `remove_by_id`, `update_by_id`,
//! `update_with`) work on the raw records, so records this build cannot
//! decode survive a rewrite untouched. None of them is atomic against a
//! second writer on the same backend; the last write wins.

use std::{collections::HashMap, sync::mpsc::Receiver, sync::Arc, thread::JoinHandle};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::dates::{marshal_dates_in_place, DateIssue};
use crate::notifier::Notifier;
use crate::storage::{ArcStorage, Storage};

mod entity;
mod envelope;
mod error;
mod migrations;
mod patch;

pub use entity::{
    field_has_id, has_id, id_field, id_from_string_or_number, record_id, Entity, ID_FIELD,
};
pub use envelope::{CollectionEnvelope, ValueEnvelope, SCHEMA_VERSION_FIELD};
pub use error::{StoreError, StoreResult};
pub use migrations::{Migrations, RecordMigration};
pub use patch::merge_patch;
pub use crate::notifier::StoreEvent;

/// A record left out of a load because it did not decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRecord {
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

/// A date field that did not parse, kept as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDateIssue {
    pub record_id: Option<String>,
    pub issue: DateIssue,
}

/// What a load found besides the records themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// `None` when the key was never written or could not be read.
    pub schema_version: Option<u32>,
    /// The stored payload was not a collection and was treated as empty.
    pub unreadable: bool,
    pub dropped: Vec<DroppedRecord>,
    pub date_issues: Vec<RecordDateIssue>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        !self.unreadable && self.dropped.is_empty() && self.date_issues.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub report: LoadReport,
}

struct RawCollection {
    records: Vec<Value>,
    report: LoadReport,
}

#[derive(Clone)]
pub struct EntityStore {
    storage: ArcStorage,
    namespace: Option<String>,
    migrations: Arc<HashMap<String, Migrations>>,
    notifier: Notifier<StoreEvent>,
}

impl EntityStore {
    pub fn new(storage: ArcStorage) -> Self {
        Self::builder(storage).build()
    }

    pub fn builder(storage: ArcStorage) -> EntityStoreBuilder {
        EntityStoreBuilder {
            storage,
            namespace: None,
            migrations: HashMap::new(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The key actually used in storage for a logical collection key.
    pub fn storage_key(&self, key: &str) -> String {
        match &self.namespace {
            Some(namespace) => format!("{}/{}", namespace, key),
            None => key.to_string(),
        }
    }

    pub fn schema_version(&self, key: &str) -> u32 {
        self.migrations
            .get(key)
            .map(Migrations::latest_version)
            .unwrap_or_else(|| Migrations::default().latest_version())
    }

    /// Receives a [`StoreEvent`] for every successful write.
    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.notifier.observer()
    }

    pub fn observe(&self, callback: impl FnMut(StoreEvent) + Send + 'static) -> JoinHandle<()> {
        self.notifier.observe(callback)
    }

    /// Logical keys written in this store's namespace.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let prefix = self.storage_key("");
        let keys = self
            .storage
            .list(&prefix)
            .map_err(|source| StoreError::StorageUnavailable {
                key: prefix.clone(),
                source,
            })?;
        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .filter(|key| !key.is_empty())
            .collect())
    }

    pub fn load<T: Entity>(&self, key: &str, date_fields: &[&str]) -> StoreResult<Vec<T>> {
        Ok(self.load_with_report(key, date_fields)?.records)
    }

    pub fn load_with_report<T: Entity>(
        &self,
        key: &str,
        date_fields: &[&str],
    ) -> StoreResult<Loaded<T>> {
        let RawCollection { records, mut report } = self.read_raw(key, date_fields)?;

        let mut decoded = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let id = record_id(&record);
            match serde_json::from_value::<T>(record) {
                Ok(entity) => decoded.push(entity),
                Err(e) => {
                    log::warn!(
                        "Dropping malformed record {} (id {:?}) in '{}': {}",
                        index,
                        id,
                        key,
                        e
                    );
                    report.dropped.push(DroppedRecord {
                        index,
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::debug!(
            "Loaded {} records from '{}' ({} dropped)",
            decoded.len(),
            key,
            report.dropped.len()
        );
        Ok(Loaded {
            records: decoded,
            report,
        })
    }

    /// Overwrites the whole collection at `key` with `records`.
    pub fn save<T: Entity>(&self, key: &str, records: &[T], date_fields: &[&str]) -> StoreResult<()> {
        let raw = records
            .iter()
            .map(|record| self.encode(key, record, date_fields))
            .collect::<StoreResult<Vec<_>>>()?;
        let count = raw.len();
        self.ensure_writable(key, envelope::decode_collection)?;
        self.write_raw(key, raw)?;
        self.notifier.notify(StoreEvent::Saved {
            key: key.to_string(),
            count,
        });
        Ok(())
    }

    /// Adds `record` to the end of the collection. Ids are not checked for
    /// duplicates.
    pub fn append<T: Entity>(&self, key: &str, record: &T, date_fields: &[&str]) -> StoreResult<()> {
        let mut collection = self.read_raw(key, date_fields)?;
        let raw = self.encode(key, record, date_fields)?;
        let id = record_id(&raw);
        collection.records.push(raw);
        self.write_raw(key, collection.records)?;
        self.notifier.notify(StoreEvent::Appended {
            key: key.to_string(),
            id,
        });
        Ok(())
    }

    /// Removes every record with `id`. Returns whether anything was removed;
    /// storage is only written when something was.
    pub fn remove_by_id(&self, key: &str, id: &str, date_fields: &[&str]) -> StoreResult<bool> {
        let removed = self.remove_where(key, date_fields, |record| has_id(record, id))?;
        Ok(!removed.is_empty())
    }

    /// Removes every raw record matching `predicate` and returns their ids.
    pub fn remove_where(
        &self,
        key: &str,
        date_fields: &[&str],
        predicate: impl Fn(&Value) -> bool,
    ) -> StoreResult<Vec<String>> {
        let collection = self.read_raw(key, date_fields)?;
        let before = collection.records.len();
        let mut removed = Vec::new();
        let kept: Vec<Value> = collection
            .records
            .into_iter()
            .filter(|record| {
                if predicate(record) {
                    removed.push(record_id(record).unwrap_or_default());
                    false
                } else {
                    true
                }
            })
            .collect();

        if kept.len() == before {
            log::debug!("Nothing to remove from '{}'", key);
            return Ok(removed);
        }

        self.write_raw(key, kept)?;
        self.notifier.notify(StoreEvent::Removed {
            key: key.to_string(),
            ids: removed.clone(),
        });
        Ok(removed)
    }

    /// Applies a JSON merge patch to the record with `id`. The patched record
    /// must still decode as `T`, otherwise nothing is written. The record's
    /// id cannot be changed by the patch.
    pub fn update_by_id<T: Entity>(
        &self,
        key: &str,
        id: &str,
        patch: &Value,
        date_fields: &[&str],
    ) -> StoreResult<bool> {
        let mut collection = self.read_raw(key, date_fields)?;
        let Some(position) = collection.records.iter().position(|r| has_id(r, id)) else {
            log::debug!("No record '{}' to update in '{}'", id, key);
            return Ok(false);
        };

        let mut candidate = collection.records[position].clone();
        let original_id = candidate.get(ID_FIELD).cloned();
        merge_patch(&mut candidate, patch);
        if let (Some(object), Some(original_id)) = (candidate.as_object_mut(), original_id) {
            object.insert(ID_FIELD.to_string(), original_id);
        }
        marshal_dates_in_place(&mut candidate, date_fields);

        if let Err(source) = serde_json::from_value::<T>(candidate.clone()) {
            return Err(StoreError::InvalidPatch {
                key: key.to_string(),
                id: id.to_string(),
                source,
            });
        }

        collection.records[position] = candidate;
        self.write_raw(key, collection.records)?;
        self.notifier.notify(StoreEvent::Updated {
            key: key.to_string(),
            id: id.to_string(),
        });
        Ok(true)
    }

    /// Decodes the record with `id`, lets `f` change it and writes it back.
    pub fn update_with<T: Entity>(
        &self,
        key: &str,
        id: &str,
        date_fields: &[&str],
        f: impl FnOnce(&mut T),
    ) -> StoreResult<bool> {
        let mut collection = self.read_raw(key, date_fields)?;
        let Some(position) = collection.records.iter().position(|r| has_id(r, id)) else {
            return Ok(false);
        };

        let mut entity: T = serde_json::from_value(collection.records[position].clone())
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                id: id.to_string(),
                source,
            })?;
        f(&mut entity);
        collection.records[position] = self.encode(key, &entity, date_fields)?;

        self.write_raw(key, collection.records)?;
        self.notifier.notify(StoreEvent::Updated {
            key: key.to_string(),
            id: id.to_string(),
        });
        Ok(true)
    }

    /// Reads a single enveloped value. Unreadable payloads read as `None`.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let Some(bytes) = self.read_bytes(key)? else {
            return Ok(None);
        };
        let (version, mut value) = match envelope::decode_value(&bytes) {
            Ok(decoded) => decoded,
            Err(reason) => {
                log::warn!("Ignoring unreadable value at '{}': {}", key, reason);
                return Ok(None);
            }
        };
        self.check_version(key, version)?;
        if let Some(migrations) = self.migrations.get(key) {
            migrations.apply(version, &mut value);
        }
        match serde_json::from_value(value) {
            Ok(decoded) => Ok(Some(decoded)),
            Err(e) => {
                log::warn!("Ignoring malformed value at '{}': {}", key, e);
                Ok(None)
            }
        }
    }

    pub fn put_value<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.ensure_writable(key, envelope::decode_value)?;
        let envelope = ValueEnvelope {
            schema_version: self.schema_version(key),
            value,
        };
        let bytes = serde_json::to_vec(&envelope).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.write_bytes(key, &bytes)?;
        self.notifier.notify(StoreEvent::Saved {
            key: key.to_string(),
            count: 1,
        });
        Ok(())
    }

    /// Reads a raw, unversioned string value.
    pub fn get_text(&self, key: &str) -> StoreResult<Option<String>> {
        let Some(bytes) = self.read_bytes(key)? else {
            return Ok(None);
        };
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Some(text)),
            Err(_) => {
                log::warn!("Ignoring non UTF-8 text at '{}'", key);
                Ok(None)
            }
        }
    }

    pub fn put_text(&self, key: &str, text: &str) -> StoreResult<()> {
        self.write_bytes(key, text.as_bytes())?;
        self.notifier.notify(StoreEvent::Saved {
            key: key.to_string(),
            count: 1,
        });
        Ok(())
    }

    pub fn remove_key(&self, key: &str) -> StoreResult<()> {
        let storage_key = self.storage_key(key);
        self.storage
            .remove(&storage_key)
            .map_err(|source| StoreError::StorageUnavailable {
                key: storage_key,
                source,
            })?;
        self.notifier.notify(StoreEvent::KeyRemoved {
            key: key.to_string(),
        });
        Ok(())
    }

    fn encode<T: Serialize>(&self, key: &str, record: &T, date_fields: &[&str]) -> StoreResult<Value> {
        let mut raw = serde_json::to_value(record).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        for issue in marshal_dates_in_place(&mut raw, date_fields) {
            log::debug!(
                "Writing unparsed date field '{}' in '{}' as stored: {}",
                issue.field,
                key,
                issue.value
            );
        }
        Ok(raw)
    }

    fn check_version(&self, key: &str, found: u32) -> StoreResult<()> {
        let supported = self.schema_version(key);
        if found > supported {
            log::warn!(
                "'{}' has schema version {}, newest supported is {}",
                key,
                found,
                supported
            );
            return Err(StoreError::UnsupportedSchemaVersion {
                key: key.to_string(),
                found,
                supported,
            });
        }
        Ok(())
    }

    /// Refuses to overwrite data written by a newer schema. Unreadable
    /// payloads may be overwritten.
    fn ensure_writable<V>(
        &self,
        key: &str,
        decode: fn(&[u8]) -> Result<(u32, V), String>,
    ) -> StoreResult<()> {
        if let Some(bytes) = self.read_bytes(key)? {
            if let Ok((version, _)) = decode(&bytes) {
                self.check_version(key, version)?;
            }
        }
        Ok(())
    }

    fn read_bytes(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let storage_key = self.storage_key(key);
        self.storage
            .get(&storage_key)
            .map_err(|source| StoreError::StorageUnavailable {
                key: storage_key,
                source,
            })
    }

    fn write_bytes(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        let storage_key = self.storage_key(key);
        self.storage
            .put(&storage_key, bytes)
            .map_err(|source| StoreError::StorageUnavailable {
                key: storage_key,
                source,
            })
    }

    fn read_raw(&self, key: &str, date_fields: &[&str]) -> StoreResult<RawCollection> {
        let mut report = LoadReport::default();
        let Some(bytes) = self.read_bytes(key)? else {
            return Ok(RawCollection {
                records: Vec::new(),
                report,
            });
        };

        let (version, mut records) = match envelope::decode_collection(&bytes) {
            Ok(decoded) => decoded,
            Err(reason) => {
                log::warn!("Ignoring unreadable collection at '{}': {}", key, reason);
                report.unreadable = true;
                return Ok(RawCollection {
                    records: Vec::new(),
                    report,
                });
            }
        };
        self.check_version(key, version)?;
        report.schema_version = Some(version);

        let default_migrations = Migrations::default();
        let migrations = self.migrations.get(key).unwrap_or(&default_migrations);
        for step in migrations.pending(version) {
            log::info!("Migrating '{}': {}", key, step.description());
        }

        for record in records.iter_mut() {
            migrations.apply(version, record);
            for issue in marshal_dates_in_place(record, date_fields) {
                let record_id = record_id(record);
                log::warn!(
                    "Unparsable date in '{}' field '{}' of record {:?}: {}",
                    key,
                    issue.field,
                    record_id,
                    issue.value
                );
                report.date_issues.push(RecordDateIssue { record_id, issue });
            }
        }

        Ok(RawCollection { records, report })
    }

    fn write_raw(&self, key: &str, records: Vec<Value>) -> StoreResult<()> {
        let envelope = CollectionEnvelope {
            schema_version: self.schema_version(key),
            records,
        };
        let bytes = serde_json::to_vec(&envelope).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.write_bytes(key, &bytes)?;
        log::debug!(
            "Wrote {} records to '{}'",
            envelope.records.len(),
            self.storage_key(key)
        );
        Ok(())
    }
}

pub struct EntityStoreBuilder {
    storage: ArcStorage,
    namespace: Option<String>,
    migrations: HashMap<String, Migrations>,
}

impl EntityStoreBuilder {
    /// Prefixes every key with `namespace/`. Empty namespaces are ignored.
    pub fn namespace(mut self, namespace: &str) -> Self {
        let namespace = namespace.trim_matches('/');
        self.namespace = (!namespace.is_empty()).then(|| namespace.to_string());
        self
    }

    pub fn migrations(mut self, key: &str, migrations: Migrations) -> Self {
        self.migrations.insert(key.to_string(), migrations);
        self
    }

    pub fn build(self) -> EntityStore {
        EntityStore {
            storage: self.storage,
            namespace: self.namespace,
            migrations: Arc::new(self.migrations),
            notifier: Notifier::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStorage, StorageError};
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct Note {
        id: String,
        text: String,
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
        }
    }

    fn store() -> (InMemoryStorage, EntityStore) {
        let memory = InMemoryStorage::new();
        let store = EntityStore::new(ArcStorage::from_storage(memory.clone()));
        (memory, store)
    }

    #[test]
    fn save_writes_a_versioned_envelope() -> anyhow::Result<()> {
        let (memory, store) = store();
        store.save("notes", &[note("n1", "hello")], &[])?;

        let raw = memory.get("notes")?.expect("written");
        assert_eq!(
            serde_json::from_slice::<Value>(&raw)?,
            json!({"schemaVersion": 1, "records": [{"id": "n1", "text": "hello"}]})
        );
        Ok(())
    }

    #[test]
    fn namespace_prefixes_storage_keys() -> anyhow::Result<()> {
        let memory = InMemoryStorage::new();
        let alice = EntityStore::builder(ArcStorage::from_storage(memory.clone()))
            .namespace("alice/")
            .build();
        let bob = EntityStore::builder(ArcStorage::from_storage(memory.clone()))
            .namespace("bob")
            .build();

        alice.save("notes", &[note("n1", "a")], &[])?;
        assert!(memory.get("alice/notes")?.is_some());
        assert!(bob.load::<Note>("notes", &[])?.is_empty());
        assert_eq!(alice.keys()?, vec!["notes"]);
        assert!(bob.keys()?.is_empty());
        Ok(())
    }

    #[test]
    fn unreadable_payload_loads_empty() -> anyhow::Result<()> {
        let (memory, store) = store();
        memory.put("notes", b"{\"id\": oops")?;

        let loaded = store.load_with_report::<Note>("notes", &[])?;
        assert!(loaded.records.is_empty());
        assert!(loaded.report.unreadable);
        assert_eq!(loaded.report.schema_version, None);
        Ok(())
    }

    #[test]
    fn newer_schema_is_refused_and_left_alone() -> anyhow::Result<()> {
        let (memory, store) = store();
        let payload = br#"{"schemaVersion":7,"records":[{"id":"n1","text":"future"}]}"#;
        memory.put("notes", payload)?;

        let err = store.load::<Note>("notes", &[]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedSchemaVersion {
                found: 7,
                supported: 1,
                ..
            }
        ));
        assert!(store.append("notes", &note("n2", "now"), &[]).is_err());
        assert_eq!(memory.get("notes")?, Some(payload.to_vec()));
        Ok(())
    }

    #[test]
    fn helpers_keep_records_they_cannot_decode() -> anyhow::Result<()> {
        let (memory, store) = store();
        memory.put("notes", br#"[{"id":"n1","text":"ok"},{"id":"n2"}]"#)?;

        store.append("notes", &note("n3", "new"), &[])?;
        assert!(store.remove_by_id("notes", "n1", &[])?);

        let loaded = store.load_with_report::<Note>("notes", &[])?;
        assert_eq!(loaded.records, vec![note("n3", "new")]);
        assert_eq!(loaded.report.dropped.len(), 1);
        assert_eq!(loaded.report.dropped[0].id.as_deref(), Some("n2"));
        Ok(())
    }

    #[test]
    fn invalid_patch_is_not_written() -> anyhow::Result<()> {
        let (_, store) = store();
        store.save("notes", &[note("n1", "a")], &[])?;

        let err = store
            .update_by_id::<Note>("notes", "n1", &json!({"text": null}), &[])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidPatch { .. }));
        assert_eq!(store.load::<Note>("notes", &[])?, vec![note("n1", "a")]);
        Ok(())
    }

    #[test]
    fn patch_cannot_change_the_id() -> anyhow::Result<()> {
        let (_, store) = store();
        store.save("notes", &[note("n1", "a")], &[])?;

        assert!(store.update_by_id::<Note>("notes", "n1", &json!({"id": "zz", "text": "b"}), &[])?);
        assert_eq!(store.load::<Note>("notes", &[])?, vec![note("n1", "b")]);
        Ok(())
    }

    #[test]
    fn update_with_edits_in_place() -> anyhow::Result<()> {
        let (_, store) = store();
        store.save("notes", &[note("n1", "a"), note("n2", "b")], &[])?;

        let found = store.update_with::<Note>("notes", "n2", &[], |n| n.text.push('!'))?;
        assert!(found);
        assert!(!store.update_with::<Note>("notes", "n9", &[], |_| {})?);
        assert_eq!(
            store.load::<Note>("notes", &[])?,
            vec![note("n1", "a"), note("n2", "b!")]
        );
        Ok(())
    }

    #[test]
    fn quota_exceeded_is_reported() -> anyhow::Result<()> {
        let memory = InMemoryStorage::with_quota(64);
        let store = EntityStore::new(ArcStorage::from_storage(memory));

        let big = note("n1", &"x".repeat(100));
        let err = store.save("notes", &[big], &[]).unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(store.load::<Note>("notes", &[])?.is_empty());
        Ok(())
    }

    #[test]
    fn disabled_storage_is_unavailable() {
        let (memory, store) = store();
        memory.set_enabled(false);

        let err = store.load::<Note>("notes", &[]).unwrap_err();
        assert!(matches!(err.storage_error(), Some(StorageError::Disabled)));
    }

    #[test]
    fn single_values_and_text() -> anyhow::Result<()> {
        let (memory, store) = store();

        assert_eq!(store.get_value::<Vec<String>>("favoriteTips")?, None);
        store.put_value("favoriteTips", &vec!["tip-1".to_string()])?;
        assert_eq!(
            store.get_value::<Vec<String>>("favoriteTips")?,
            Some(vec!["tip-1".to_string()])
        );

        store.put_text("apiKey_openai", "sk-123")?;
        assert_eq!(memory.get("apiKey_openai")?, Some(b"sk-123".to_vec()));
        assert_eq!(store.get_text("apiKey_openai")?.as_deref(), Some("sk-123"));

        store.remove_key("apiKey_openai")?;
        assert_eq!(store.get_text("apiKey_openai")?, None);
        Ok(())
    }

    #[test]
    fn writes_are_announced() -> anyhow::Result<()> {
        let (_, store) = store();
        let events = store.subscribe();

        store.append("notes", &note("n1", "a"), &[])?;
        store.update_by_id::<Note>("notes", "n1", &json!({"text": "b"}), &[])?;
        store.remove_by_id("notes", "n1", &[])?;
        // Nothing removed, nothing written, nothing announced.
        store.remove_by_id("notes", "n1", &[])?;

        let received: Vec<StoreEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                StoreEvent::Appended {
                    key: "notes".to_string(),
                    id: Some("n1".to_string())
                },
                StoreEvent::Updated {
                    key: "notes".to_string(),
                    id: "n1".to_string()
                },
                StoreEvent::Removed {
                    key: "notes".to_string(),
                    ids: vec!["n1".to_string()]
                },
            ]
        );
        assert!(events.recv_timeout(Duration::from_millis(10)).is_err());
        Ok(())
    }
}
