//! Typed records for every collection the tracker persists.

use thiserror::Error;
use uuid::Uuid;

use crate::dates::StoredDate;
use crate::storage::ArcStorage;
use crate::store::{Entity, EntityStore, EntityStoreBuilder, Migrations};

mod calendar;
mod child;
mod family;
mod gallery;
mod growth;
mod settings;
mod timeline;

pub use calendar::{AppointmentReminder, CalendarEvent, CalendarEventKind};
pub use child::{Child, Gender, Measurement};
pub use family::FamilyMember;
pub use gallery::{GalleryItem, MediaKind};
pub use growth::GrowthRecord;
pub use settings::{api_key_key, EmailReminderSettings, ReminderSettingsByUser};
pub use timeline::{TimelineEvent, TimelineEventKind};

pub const FAVORITE_TIPS_KEY: &str = "favoriteTips";
pub const FAVORITE_QUESTIONS_KEY: &str = "favoriteQuestions";
pub const EMAIL_REMINDER_SETTINGS_KEY: &str = "emailReminderSettings";
pub const API_KEY_PREFIX: &str = "apiKey_";

/// A record type with its own collection key.
pub trait Collection: Entity + Clone {
    const KEY: &'static str;
    const DATE_FIELDS: &'static [&'static str] = &[];
    /// Fields set by [`Collection::normalize`]. Patches cannot change them.
    const DERIVED_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// Recomputes derived fields before the record is written.
    fn normalize(&mut self) {}

    /// The child this record belongs to, for child-scoped collections.
    fn child_id(&self) -> Option<&str> {
        None
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    fn migrations() -> Migrations {
        Migrations::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Time-ordered id for a new record.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Keys of the collections whose records carry a `childId`.
pub const CHILD_SCOPED_KEYS: &[(&str, &[&str])] = &[
    (CalendarEvent::KEY, CalendarEvent::DATE_FIELDS),
    (TimelineEvent::KEY, TimelineEvent::DATE_FIELDS),
    (GrowthRecord::KEY, GrowthRecord::DATE_FIELDS),
    (GalleryItem::KEY, GalleryItem::DATE_FIELDS),
    (AppointmentReminder::KEY, AppointmentReminder::DATE_FIELDS),
];

/// Registers the migrations of every collection on `builder`.
pub fn register_migrations(builder: EntityStoreBuilder) -> EntityStoreBuilder {
    builder
        .migrations(Child::KEY, Child::migrations())
        .migrations(CalendarEvent::KEY, CalendarEvent::migrations())
        .migrations(TimelineEvent::KEY, TimelineEvent::migrations())
        .migrations(GrowthRecord::KEY, GrowthRecord::migrations())
        .migrations(GalleryItem::KEY, GalleryItem::migrations())
        .migrations(FamilyMember::KEY, FamilyMember::migrations())
        .migrations(AppointmentReminder::KEY, AppointmentReminder::migrations())
}

/// An [`EntityStore`] that knows every collection's migrations.
pub fn tracker_store(storage: ArcStorage, namespace: Option<&str>) -> EntityStore {
    let mut builder = register_migrations(EntityStore::builder(storage));
    if let Some(namespace) = namespace {
        builder = builder.namespace(namespace);
    }
    builder.build()
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

pub(crate) fn require_date(field: &'static str, value: &StoredDate) -> Result<(), ValidationError> {
    match value {
        StoredDate::Valid(_) => Ok(()),
        StoredDate::Unparsed(raw) => Err(ValidationError::new(
            field,
            format!("'{}' is not a date", raw),
        )),
    }
}

pub(crate) fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    let valid = value
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !valid {
        return Err(ValidationError::new(
            field,
            format!("'{}' is not an email address", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let first = new_id();
        assert_ne!(first, new_id());
        assert_eq!(Uuid::parse_str(&first).map(|id| id.get_version_num()).ok(), Some(7));
    }

    #[test]
    fn field_checks() {
        assert!(require("name", "Mila").is_ok());
        assert_eq!(
            require("name", "  ").unwrap_err(),
            ValidationError::new("name", "is required")
        );
        assert!(require_date("date", &StoredDate::parse("2024-03-14")).is_ok());
        assert!(require_date("date", &StoredDate::parse("soon")).is_err());
        assert!(require_email("email", "grandma@example.com").is_ok());
        assert!(require_email("email", "grandma").is_err());
        assert!(require_email("email", "@example.com").is_err());
    }
}
