use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{require_email, ValidationError, API_KEY_PREFIX};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmailReminderSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_days_before")]
    pub days_before: u32,
}

fn default_days_before() -> u32 {
    1
}

impl Default for EmailReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            email: String::new(),
            days_before: default_days_before(),
        }
    }
}

impl EmailReminderSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled {
            require_email("email", &self.email)?;
        }
        Ok(())
    }
}

/// Stored under `emailReminderSettings`, keyed by user id.
pub type ReminderSettingsByUser = BTreeMap<String, EmailReminderSettings>;

/// Storage key of the API key for `provider`.
pub fn api_key_key(provider: &str) -> String {
    format!("{}{}", API_KEY_PREFIX, provider)
}
