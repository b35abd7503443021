use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{require, require_date, require_email, Collection, ValidationError};
use crate::dates::StoredDate;
use crate::store::id_from_string_or_number;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalendarEventKind {
    Appointment,
    Milestone,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub date: StoredDate,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: CalendarEventKind,
    pub child_id: String,
    /// Wall clock time as entered, e.g. `"09:30"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CalendarEvent {
    pub fn new(child_id: &str, kind: CalendarEventKind, title: &str, date: StoredDate) -> Self {
        Self {
            id: String::new(),
            date,
            title: title.to_string(),
            kind,
            child_id: child_id.to_string(),
            time: None,
            location: None,
            note: None,
        }
    }
}

impl Collection for CalendarEvent {
    const KEY: &'static str = "events";
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
        require("title", &self.title)?;
        require("childId", &self.child_id)?;
        require_date("date", &self.date)
    }
}

/// An email reminder queued for an appointment.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentReminder {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub event_id: String,
    pub child_id: String,
    pub title: String,
    pub appointment_date: StoredDate,
    pub email: String,
    #[serde(default)]
    pub sent: bool,
}

impl AppointmentReminder {
    pub fn for_event(event: &CalendarEvent, email: &str) -> Self {
        Self {
            id: String::new(),
            event_id: event.id.clone(),
            child_id: event.child_id.clone(),
            title: event.title.clone(),
            appointment_date: event.date.clone(),
            email: email.to_string(),
            sent: false,
        }
    }

    /// Unsent and within `days_before` days ahead of the appointment.
    pub fn is_due(&self, now: DateTime<Utc>, days_before: u32) -> bool {
        let Some(appointment) = self.appointment_date.as_datetime() else {
            return false;
        };
        !self.sent
            && now < appointment
            && appointment - Duration::days(i64::from(days_before)) <= now
    }
}

impl Collection for AppointmentReminder {
    const KEY: &'static str = "appointmentReminders";
    const DATE_FIELDS: &'static [&'static str] = &["appointmentDate"];

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
        require("eventId", &self.event_id)?;
        require_email("email", &self.email)?;
        require_date("appointmentDate", &self.appointment_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn checkup() -> CalendarEvent {
        let mut event = CalendarEvent::new(
            "c1",
            CalendarEventKind::Appointment,
            "Checkup",
            StoredDate::parse("2024-03-14T09:30:00Z"),
        );
        event.id = "e1".to_string();
        event
    }

    #[test]
    fn kind_is_stored_as_type() -> anyhow::Result<()> {
        let value = serde_json::to_value(checkup())?;
        assert_eq!(value["type"], json!("appointment"));
        assert_eq!(value["childId"], json!("c1"));
        assert!(value.get("kind").is_none());
        assert!(value.get("location").is_none());
        Ok(())
    }

    #[test]
    fn reminder_due_window() {
        let reminder = AppointmentReminder::for_event(&checkup(), "parent@example.com");
        assert!(reminder.validate().is_ok());
        assert_eq!(reminder.event_id, "e1");

        let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap();
        assert!(!reminder.is_due(at(12, 9), 1));
        assert!(reminder.is_due(at(13, 10), 1));
        assert!(reminder.is_due(at(12, 10), 2));
        assert!(!reminder.is_due(at(14, 10), 1));

        let sent = AppointmentReminder {
            sent: true,
            ..reminder
        };
        assert!(!sent.is_due(at(13, 10), 1));
    }
}
