//! Application level policies on top of the entity store: sample data,
//! validation, id assignment and child deletion.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::TrackerConfig;
use crate::model::{
    api_key_key, new_id, tracker_store, AppointmentReminder, CalendarEvent, Child, Collection,
    EmailReminderSettings, GalleryItem, GrowthRecord, ReminderSettingsByUser, TimelineEvent,
    ValidationError, CHILD_SCOPED_KEYS, EMAIL_REMINDER_SETTINGS_KEY, FAVORITE_QUESTIONS_KEY,
    FAVORITE_TIPS_KEY,
};
use crate::samples::{is_sample_child_id, sample_children, sample_timeline};
use crate::store::{
    field_has_id, id_field, merge_patch, record_id, EntityStore, LoadReport, StoreError,
};

const CHILD_ID_FIELD: &str = "childId";

pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid record for '{collection}': {source}")]
    Validation {
        collection: &'static str,
        source: ValidationError,
    },

    #[error("sample child '{0}' cannot be deleted")]
    SampleNotDeletable(String),

    #[error("no record '{id}' in '{collection}'")]
    NotFound {
        collection: &'static str,
        id: String,
    },
}

impl TrackerError {
    fn validation(collection: &'static str) -> impl FnOnce(ValidationError) -> TrackerError {
        move |source| TrackerError::Validation { collection, source }
    }

    fn not_found(collection: &'static str, id: &str) -> TrackerError {
        TrackerError::NotFound {
            collection,
            id: id.to_string(),
        }
    }
}

/// Records removed along with a child, by collection key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub removed: BTreeMap<&'static str, Vec<String>>,
}

impl CascadeReport {
    pub fn total(&self) -> usize {
        self.removed.values().map(Vec::len).sum()
    }
}

/// A child-scoped record whose child no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanRef {
    pub collection: &'static str,
    pub id: Option<String>,
    pub child_id: String,
}

#[derive(Clone)]
pub struct Tracker {
    store: EntityStore,
    seed_samples: bool,
}

impl Tracker {
    pub fn new(store: EntityStore, seed_samples: bool) -> Self {
        Self {
            store,
            seed_samples,
        }
    }

    pub fn open(config: &TrackerConfig) -> anyhow::Result<Self> {
        let storage = config.open_storage()?;
        let store = tracker_store(storage, config.namespace.as_deref());
        log::info!(
            "Opened tracker (namespace {:?}, samples {})",
            store.namespace(),
            config.seed_samples
        );
        Ok(Self::new(store, config.seed_samples))
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Every record of `T`, or the sample records if nothing was ever saved.
    pub fn list<T: Collection>(&self) -> TrackerResult<Vec<T>> {
        Ok(self.list_with_report::<T>()?.0)
    }

    pub fn list_with_report<T: Collection>(&self) -> TrackerResult<(Vec<T>, LoadReport)> {
        let loaded = self.store.load_with_report::<T>(T::KEY, T::DATE_FIELDS)?;
        if never_written(&loaded.report) {
            return Ok((self.samples::<T>(), loaded.report));
        }
        Ok((loaded.records, loaded.report))
    }

    pub fn find<T: Collection>(&self, id: &str) -> TrackerResult<Option<T>> {
        Ok(self.list::<T>()?.into_iter().find(|record| record.id() == id))
    }

    /// Records of `T` that belong to `child_id`.
    pub fn for_child<T: Collection>(&self, child_id: &str) -> TrackerResult<Vec<T>> {
        Ok(self
            .list::<T>()?
            .into_iter()
            .filter(|record| record.child_id() == Some(child_id))
            .collect())
    }

    /// Validates `record`, gives it an id if it has none and appends it.
    pub fn add<T: Collection>(&self, mut record: T) -> TrackerResult<T> {
        record.validate().map_err(TrackerError::validation(T::KEY))?;
        if record.id().trim().is_empty() {
            record.set_id(new_id());
        }
        record.normalize();
        self.seed_if_unwritten::<T>()?;
        self.store.append(T::KEY, &record, T::DATE_FIELDS)?;
        log::debug!("Added '{}' to '{}'", record.id(), T::KEY);
        Ok(record)
    }

    /// Replaces the stored record with the same id.
    pub fn replace<T: Collection>(&self, record: &T) -> TrackerResult<()> {
        record.validate().map_err(TrackerError::validation(T::KEY))?;
        self.seed_if_unwritten::<T>()?;
        let mut replacement = record.clone();
        replacement.normalize();
        let found = self
            .store
            .update_with::<T>(T::KEY, record.id(), T::DATE_FIELDS, |stored| {
                *stored = replacement
            })?;
        if !found {
            return Err(TrackerError::not_found(T::KEY, record.id()));
        }
        Ok(())
    }

    /// Applies a JSON merge patch to the record with `id` and returns the result.
    /// Derived fields in `patch` are ignored.
    pub fn patch<T: Collection>(&self, id: &str, patch: &Value) -> TrackerResult<T> {
        let patch = &without_fields(patch, T::DERIVED_FIELDS);
        let current = self
            .find::<T>(id)?
            .ok_or_else(|| TrackerError::not_found(T::KEY, id))?;
        let mut candidate = serde_json::to_value(&current).map_err(|source| StoreError::Encode {
            key: T::KEY.to_string(),
            source,
        })?;
        merge_patch(&mut candidate, patch);
        let mut patched: T =
            serde_json::from_value(candidate).map_err(|source| StoreError::InvalidPatch {
                key: T::KEY.to_string(),
                id: id.to_string(),
                source,
            })?;
        patched.set_id(id.to_string());
        patched.normalize();
        patched.validate().map_err(TrackerError::validation(T::KEY))?;

        self.seed_if_unwritten::<T>()?;
        self.store.update_by_id::<T>(T::KEY, id, patch, T::DATE_FIELDS)?;
        Ok(patched)
    }

    /// Removes the record with `id`. Children go through [`Tracker::remove_child`].
    pub fn remove<T: Collection>(&self, id: &str) -> TrackerResult<bool> {
        if T::KEY == Child::KEY {
            return match self.remove_child(id) {
                Ok(_) => Ok(true),
                Err(TrackerError::NotFound { .. }) => Ok(false),
                Err(e) => Err(e),
            };
        }
        self.seed_if_unwritten::<T>()?;
        Ok(self.store.remove_by_id(T::KEY, id, T::DATE_FIELDS)?)
    }

    pub fn children(&self) -> TrackerResult<Vec<Child>> {
        self.list::<Child>()
    }

    pub fn add_child(&self, child: Child) -> TrackerResult<Child> {
        self.add(child)
    }

    /// Deletes a child and every record that belongs to it. Sample children
    /// are recognised by id, whatever their stored `isSample` flag says.
    pub fn remove_child(&self, id: &str) -> TrackerResult<CascadeReport> {
        if is_sample_child_id(id) {
            return Err(TrackerError::SampleNotDeletable(id.to_string()));
        }
        if self.find::<Child>(id)?.is_none() {
            return Err(TrackerError::not_found(Child::KEY, id));
        }

        self.store.remove_by_id(Child::KEY, id, Child::DATE_FIELDS)?;

        let mut report = CascadeReport::default();
        for &(key, date_fields) in CHILD_SCOPED_KEYS {
            let removed = self.store.remove_where(key, date_fields, |record| {
                field_has_id(record, CHILD_ID_FIELD, id)
            })?;
            if !removed.is_empty() {
                report.removed.insert(key, removed);
            }
        }
        log::info!(
            "Removed child '{}' and {} related records",
            id,
            report.total()
        );
        Ok(report)
    }

    /// Child-scoped records whose `childId` matches no child.
    pub fn orphans(&self) -> TrackerResult<Vec<OrphanRef>> {
        let children: HashSet<String> = self.children()?.into_iter().map(|c| c.id).collect();
        let mut orphans = Vec::new();
        for &(key, date_fields) in CHILD_SCOPED_KEYS {
            for record in self.store.load::<Value>(key, date_fields)? {
                let Some(child_id) = id_field(&record, CHILD_ID_FIELD) else {
                    continue;
                };
                if !child_id.is_empty() && !children.contains(&child_id) {
                    orphans.push(OrphanRef {
                        collection: key,
                        id: record_id(&record),
                        child_id,
                    });
                }
            }
        }
        Ok(orphans)
    }

    pub fn timeline_for_child(&self, child_id: &str) -> TrackerResult<Vec<TimelineEvent>> {
        let mut events = self.for_child::<TimelineEvent>(child_id)?;
        events.sort_by_key(|event| event.date.as_datetime());
        Ok(events)
    }

    pub fn growth_history(&self, child_id: &str) -> TrackerResult<Vec<GrowthRecord>> {
        let mut records = self.for_child::<GrowthRecord>(child_id)?;
        records.sort_by_key(|record| record.date.as_datetime());
        Ok(records)
    }

    /// Calendar events falling on `day` (UTC).
    pub fn events_on(&self, day: NaiveDate) -> TrackerResult<Vec<CalendarEvent>> {
        Ok(self
            .list::<CalendarEvent>()?
            .into_iter()
            .filter(|event| event.date.date_naive() == Some(day))
            .collect())
    }

    /// The next `limit` calendar events at or after `now`, soonest first.
    pub fn upcoming_events(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> TrackerResult<Vec<CalendarEvent>> {
        let mut events: Vec<CalendarEvent> = self
            .list::<CalendarEvent>()?
            .into_iter()
            .filter(|event| event.date.as_datetime().is_some_and(|date| date >= now))
            .collect();
        events.sort_by_key(|event| event.date.as_datetime());
        events.truncate(limit);
        Ok(events)
    }

    pub fn gallery_with_tag(&self, tag: &str) -> TrackerResult<Vec<GalleryItem>> {
        Ok(self
            .list::<GalleryItem>()?
            .into_iter()
            .filter(|item| item.has_tag(tag))
            .collect())
    }

    pub fn favorite_tips(&self) -> TrackerResult<Vec<String>> {
        self.value_or_default(FAVORITE_TIPS_KEY)
    }

    /// Adds or removes a tip id. Returns whether it is now a favourite.
    pub fn toggle_favorite_tip(&self, tip_id: &str) -> TrackerResult<bool> {
        self.toggle(FAVORITE_TIPS_KEY, tip_id)
    }

    pub fn favorite_questions(&self) -> TrackerResult<Vec<String>> {
        self.value_or_default(FAVORITE_QUESTIONS_KEY)
    }

    pub fn toggle_favorite_question(&self, question: &str) -> TrackerResult<bool> {
        self.toggle(FAVORITE_QUESTIONS_KEY, question)
    }

    pub fn api_key(&self, provider: &str) -> TrackerResult<Option<String>> {
        Ok(self.store.get_text(&api_key_key(provider))?)
    }

    pub fn set_api_key(&self, provider: &str, key: &str) -> TrackerResult<()> {
        let invalid = TrackerError::validation("apiKey");
        if provider.trim().is_empty() {
            return Err(invalid(ValidationError::new("provider", "is required")));
        }
        if key.trim().is_empty() {
            return Err(invalid(ValidationError::new("apiKey", "is required")));
        }
        Ok(self.store.put_text(&api_key_key(provider), key.trim())?)
    }

    pub fn remove_api_key(&self, provider: &str) -> TrackerResult<()> {
        Ok(self.store.remove_key(&api_key_key(provider))?)
    }

    pub fn reminder_settings(&self, user_id: &str) -> TrackerResult<EmailReminderSettings> {
        let all: ReminderSettingsByUser = self.value_or_default(EMAIL_REMINDER_SETTINGS_KEY)?;
        Ok(all.get(user_id).cloned().unwrap_or_default())
    }

    pub fn set_reminder_settings(
        &self,
        user_id: &str,
        settings: EmailReminderSettings,
    ) -> TrackerResult<()> {
        settings
            .validate()
            .map_err(TrackerError::validation(EMAIL_REMINDER_SETTINGS_KEY))?;
        let mut all: ReminderSettingsByUser = self.value_or_default(EMAIL_REMINDER_SETTINGS_KEY)?;
        all.insert(user_id.to_string(), settings);
        Ok(self.store.put_value(EMAIL_REMINDER_SETTINGS_KEY, &all)?)
    }

    /// Queues an email reminder for the calendar event `event_id`.
    pub fn schedule_reminder(&self, event_id: &str, email: &str) -> TrackerResult<AppointmentReminder> {
        let event = self
            .find::<CalendarEvent>(event_id)?
            .ok_or_else(|| TrackerError::not_found(CalendarEvent::KEY, event_id))?;
        self.add(AppointmentReminder::for_event(&event, email))
    }

    /// Unsent reminders inside `user_id`'s reminder window at `now`.
    pub fn due_reminders(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> TrackerResult<Vec<AppointmentReminder>> {
        let settings = self.reminder_settings(user_id)?;
        if !settings.enabled {
            return Ok(Vec::new());
        }
        Ok(self
            .list::<AppointmentReminder>()?
            .into_iter()
            .filter(|reminder| reminder.is_due(now, settings.days_before))
            .collect())
    }

    pub fn mark_reminder_sent(&self, id: &str) -> TrackerResult<()> {
        let found = self.store.update_with::<AppointmentReminder>(
            AppointmentReminder::KEY,
            id,
            AppointmentReminder::DATE_FIELDS,
            |reminder| reminder.sent = true,
        )?;
        if !found {
            return Err(TrackerError::not_found(AppointmentReminder::KEY, id));
        }
        Ok(())
    }

    fn value_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> TrackerResult<T> {
        Ok(self.store.get_value::<T>(key)?.unwrap_or_default())
    }

    fn toggle(&self, key: &str, item: &str) -> TrackerResult<bool> {
        let mut items: Vec<String> = self.value_or_default(key)?;
        let now_favourite = match items.iter().position(|existing| existing == item) {
            Some(index) => {
                items.remove(index);
                false
            }
            None => {
                items.push(item.to_string());
                true
            }
        };
        self.store.put_value(key, &items)?;
        Ok(now_favourite)
    }

    fn samples<T: Collection>(&self) -> Vec<T> {
        if !self.seed_samples {
            return Vec::new();
        }
        let samples = if T::KEY == Child::KEY {
            to_records(&sample_children())
        } else if T::KEY == TimelineEvent::KEY {
            to_records(&sample_timeline())
        } else {
            return Vec::new();
        };
        match samples.map(serde_json::from_value::<Vec<T>>) {
            Some(Ok(records)) => records,
            _ => {
                log::warn!("Sample records for '{}' do not decode", T::KEY);
                Vec::new()
            }
        }
    }

    /// Persists the samples the first time a collection that shows them is
    /// written, so edits apply on top of what the user was looking at.
    fn seed_if_unwritten<T: Collection>(&self) -> TrackerResult<()> {
        if !self.seed_samples {
            return Ok(());
        }
        let report = self.store.load_with_report::<Value>(T::KEY, T::DATE_FIELDS)?.report;
        if !never_written(&report) {
            return Ok(());
        }
        let samples = self.samples::<T>();
        if !samples.is_empty() {
            log::debug!("Seeding '{}' with {} sample records", T::KEY, samples.len());
            self.store.save(T::KEY, &samples, T::DATE_FIELDS)?;
        }
        Ok(())
    }
}

fn never_written(report: &LoadReport) -> bool {
    report.schema_version.is_none() && !report.unreadable
}

fn without_fields(patch: &Value, fields: &[&str]) -> Value {
    let mut patch = patch.clone();
    if let Some(object) = patch.as_object_mut() {
        for field in fields {
            if object.remove(*field).is_some() {
                log::debug!("Ignoring patch of derived field '{}'", field);
            }
        }
    }
    patch
}

fn to_records<S: Serialize>(records: &S) -> Option<Value> {
    serde_json::to_value(records).ok()
}
