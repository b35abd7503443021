use serde::{Deserialize, Serialize};

use super::{require_date, Collection, ValidationError};
use crate::dates::StoredDate;
use crate::store::id_from_string_or_number;

/// One measurement session. Weight in kg, lengths in cm.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    pub date: StoredDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_circumference: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl GrowthRecord {
    pub fn new(child_id: &str, date: StoredDate) -> Self {
        Self {
            id: String::new(),
            child_id: Some(child_id.to_string()),
            date,
            weight: None,
            height: None,
            head_circumference: None,
            notes: None,
        }
    }
}

impl Collection for GrowthRecord {
    const KEY: &'static str = "growthRecords";
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
        require_date("date", &self.date)?;
        let measurements = [
            ("weight", self.weight),
            ("height", self.height),
            ("headCircumference", self.head_circumference),
        ];
        if measurements.iter().all(|(_, value)| value.is_none()) {
            return Err(ValidationError::new("weight", "at least one measurement is required"));
        }
        for (field, value) in measurements {
            if value.is_some_and(|value| !(value.is_finite() && value > 0.0)) {
                return Err(ValidationError::new(field, "must be a positive number"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_a_positive_measurement() {
        let mut record = GrowthRecord::new("c1", StoredDate::parse("2024-03-14"));
        assert!(record.validate().is_err());

        record.weight = Some(6.2);
        assert!(record.validate().is_ok());

        record.height = Some(0.0);
        assert_eq!(record.validate().unwrap_err().field, "height");
    }
}
