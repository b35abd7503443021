use serde::{Deserialize, Serialize};

use super::{require, require_date, Collection, ValidationError};
use crate::dates::StoredDate;
use crate::store::id_from_string_or_number;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimelineEventKind {
    Milestone,
    Appointment,
    Vaccine,
    Health,
    Other,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: TimelineEventKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: StoredDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

impl TimelineEvent {
    pub fn new(kind: TimelineEventKind, title: &str, date: StoredDate) -> Self {
        Self {
            id: String::new(),
            child_id: None,
            kind,
            title: title.to_string(),
            description: String::new(),
            date,
            media_url: None,
        }
    }
}

impl Collection for TimelineEvent {
    const KEY: &'static str = "timelineEvents";
    const DATE_FIELDS: &'static [&'static str] = &["date"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn child_id(&self) -> Option<&str> {
        self.child_id.as_deref()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("title", &self.title)?;
        require_date("date", &self.date)
    }
}
