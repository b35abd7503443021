//! Per-collection record migrations.
//!
//! A collection written before versioning existed is a bare JSON array and is
//! read as schema version 0. Step `n` in a [`Migrations`] list upgrades a
//! record from version `n` to `n + 1`, so the latest version is the number of
//! steps. A list with no steps still writes version 1.
//!
//! Step 0 is therefore always the upgrade from a bare array to the envelope.
//! A collection that was already written with no steps holds version 1 data,
//! so its first real migration must go at index 1, after
//! [`RecordMigration::envelope`]. Placed at index 0 it would be skipped for
//! every record already stored.

use std::{fmt, sync::Arc};

use serde_json::Value;

type UpFn = dyn Fn(&mut Value) + Send + Sync;

#[derive(Clone)]
pub struct RecordMigration {
    description: String,
    up: Arc<UpFn>,
}

impl RecordMigration {
    pub fn up(description: &str, up: impl Fn(&mut Value) + Send + Sync + 'static) -> Self {
        Self {
            description: description.to_string(),
            up: Arc::new(up),
        }
    }

    /// Introduces the envelope without touching records.
    pub fn envelope() -> Self {
        Self::up("wrap legacy array in a versioned envelope", |_| {})
    }

    /// Moves `from` to `to` unless the record already carries `to`.
    pub fn rename_field(from: &str, to: &str) -> Self {
        let (from, to) = (from.to_string(), to.to_string());
        Self::up(&format!("rename '{}' to '{}'", from, to), move |record| {
            let Some(object) = record.as_object_mut() else {
                return;
            };
            if let Some(value) = object.remove(&from) {
                let keep_existing = object.get(&to).is_some_and(|existing| !existing.is_null());
                if !keep_existing {
                    object.insert(to.clone(), value);
                }
            }
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for RecordMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordMigration")
            .field("description", &self.description)
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Migrations {
    steps: Vec<RecordMigration>,
}

impl Migrations {
    pub fn new(steps: Vec<RecordMigration>) -> Self {
        Self { steps }
    }

    pub fn latest_version(&self) -> u32 {
        (self.steps.len() as u32).max(1)
    }

    /// Runs every step from `from_version` up to the latest version.
    pub fn apply(&self, from_version: u32, record: &mut Value) {
        for step in self.steps.iter().skip(from_version as usize) {
            (step.up)(record);
        }
    }

    pub fn pending(&self, from_version: u32) -> impl Iterator<Item = &RecordMigration> {
        self.steps.iter().skip(from_version as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_migrations_write_version_one() {
        assert_eq!(Migrations::default().latest_version(), 1);
        let mut record = json!({"id": "c1"});
        Migrations::default().apply(0, &mut record);
        assert_eq!(record, json!({"id": "c1"}));
    }

    #[test]
    fn applies_only_pending_steps() {
        let migrations = Migrations::new(vec![
            RecordMigration::rename_field("dob", "dateOfBirth"),
            RecordMigration::up("default gender", |record| {
                if let Some(object) = record.as_object_mut() {
                    object.entry("gender").or_insert(json!("other"));
                }
            }),
        ]);
        assert_eq!(migrations.latest_version(), 2);

        let mut legacy = json!({"id": "c1", "dob": "2024-01-01"});
        migrations.apply(0, &mut legacy);
        assert_eq!(
            legacy,
            json!({"id": "c1", "dateOfBirth": "2024-01-01", "gender": "other"})
        );

        let mut current = json!({"id": "c2", "dob": "kept", "gender": "female"});
        migrations.apply(1, &mut current);
        assert_eq!(current, json!({"id": "c2", "dob": "kept", "gender": "female"}));

        assert_eq!(migrations.pending(2).count(), 0);
    }

    #[test]
    fn first_step_after_envelope_reaches_version_one_data() {
        let add_default_unit = || {
            RecordMigration::up("default unit", |record| {
                if let Some(object) = record.as_object_mut() {
                    object.entry("unit").or_insert(json!("kg"));
                }
            })
        };

        let misplaced = Migrations::new(vec![add_default_unit()]);
        assert_eq!(misplaced.latest_version(), 1);
        assert_eq!(misplaced.pending(1).count(), 0);

        let migrations = Migrations::new(vec![RecordMigration::envelope(), add_default_unit()]);
        assert_eq!(migrations.latest_version(), 2);
        let mut stored_at_v1 = json!({"id": "g1"});
        migrations.apply(1, &mut stored_at_v1);
        assert_eq!(stored_at_v1, json!({"id": "g1", "unit": "kg"}));

        let mut legacy = json!({"id": "g0"});
        migrations.apply(0, &mut legacy);
        assert_eq!(legacy, json!({"id": "g0", "unit": "kg"}));
    }

    #[test]
    fn rename_prefers_existing_target() {
        let step = RecordMigration::rename_field("dob", "dateOfBirth");
        let mut record = json!({"dob": "2023-01-01", "dateOfBirth": "2024-01-01"});
        (step.up)(&mut record);
        assert_eq!(record, json!({"dateOfBirth": "2024-01-01"}));

        let mut record = json!({"dob": "2023-01-01", "dateOfBirth": null});
        (step.up)(&mut record);
        assert_eq!(record, json!({"dateOfBirth": "2023-01-01"}));
    }
}
