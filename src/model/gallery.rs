use serde::{Deserialize, Serialize};

use super::{require, require_date, Collection, ValidationError};
use crate::dates::StoredDate;
use crate::store::id_from_string_or_number;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub child_id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// A data URL or an object URL; not guaranteed to outlive the session.
    pub url: String,
    #[serde(default)]
    pub caption: String,
    pub date: StoredDate,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl GalleryItem {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl Collection for GalleryItem {
    const KEY: &'static str = "galleryItems";
    const DATE_FIELDS: &'static [&'static str] = &["date"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn child_id(&self) -> Option<&str> {
        Some(&self.child_id)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("childId", &self.child_id)?;
        require("url", &self.url)?;
        require_date("date", &self.date)
    }
}
