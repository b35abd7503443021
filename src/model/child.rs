use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{require, require_date, Collection, ValidationError};
use crate::age::Age;
use crate::dates::StoredDate;
use crate::samples::is_sample_child_id;
use crate::store::{id_from_string_or_number, Migrations, RecordMigration};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    #[default]
    Other,
}

/// A numeric measurement with its unit, e.g. `{"value": 3.4, "unit": "kg"}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Measurement {
    pub value: f64,
    pub unit: String,
}

impl Measurement {
    pub fn new(value: f64, unit: &str) -> Self {
        Self {
            value,
            unit: unit.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<StoredDate>,
    /// Free-text age entered when the date of birth is unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_text: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_weight: Option<Measurement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_height: Option<Measurement>,
    #[serde(default)]
    pub is_sample: bool,
}

impl Child {
    pub fn new(name: &str, date_of_birth: NaiveDate, gender: Gender) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            date_of_birth: Some(date_of_birth.into()),
            age_text: None,
            gender,
            profile_image_url: None,
            birth_weight: None,
            birth_height: None,
            is_sample: false,
        }
    }

    pub fn age_on(&self, on: NaiveDate) -> Option<Age> {
        let born = self.date_of_birth.as_ref()?.date_naive()?;
        Age::between(born, on)
    }

    /// Human age at `on`, falling back to the free-text age.
    pub fn age_label(&self, on: NaiveDate) -> String {
        match (self.age_on(on), &self.age_text) {
            (Some(age), _) => age.label(),
            (None, Some(text)) if !text.trim().is_empty() => text.trim().to_string(),
            _ => "Unknown age".to_string(),
        }
    }
}

impl Collection for Child {
    const KEY: &'static str = "children";
    const DATE_FIELDS: &'static [&'static str] = &["dateOfBirth"];
    const DERIVED_FIELDS: &'static [&'static str] = &["isSample"];

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn normalize(&mut self) {
        self.is_sample = is_sample_child_id(&self.id);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        if let Some(date_of_birth) = &self.date_of_birth {
            require_date("dateOfBirth", date_of_birth)?;
        }
        for (field, measurement) in [
            ("birthWeight", &self.birth_weight),
            ("birthHeight", &self.birth_height),
        ] {
            if let Some(measurement) = measurement {
                if !(measurement.value.is_finite() && measurement.value > 0.0) {
                    return Err(ValidationError::new(field, "must be a positive number"));
                }
                require(field, &measurement.unit)?;
            }
        }
        Ok(())
    }

    fn migrations() -> Migrations {
        Migrations::new(vec![RecordMigration::rename_field("dob", "dateOfBirth")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn serialises_camel_case() -> anyhow::Result<()> {
        let mut child = Child::new("Mila", date(2024, 1, 10), Gender::Female);
        child.id = "c1".to_string();
        child.birth_weight = Some(Measurement::new(3.4, "kg"));

        assert_eq!(
            serde_json::to_value(&child)?,
            json!({
                "id": "c1",
                "name": "Mila",
                "dateOfBirth": "2024-01-10T00:00:00.000Z",
                "gender": "female",
                "birthWeight": {"value": 3.4, "unit": "kg"},
                "isSample": false,
            })
        );
        Ok(())
    }

    #[test]
    fn legacy_records_decode() -> anyhow::Result<()> {
        let mut raw = json!({"id": 1700000000000i64, "name": "Noah", "dob": "2023-05-01"});
        Child::migrations().apply(0, &mut raw);

        let child: Child = serde_json::from_value(raw)?;
        assert_eq!(child.id, "1700000000000");
        assert_eq!(child.date_of_birth, Some(date(2023, 5, 1).into()));
        assert_eq!(child.gender, Gender::Other);
        assert!(!child.is_sample);
        Ok(())
    }

    #[test]
    fn age_label_falls_back_to_text() {
        let mut child = Child::new("Mila", date(2024, 1, 10), Gender::Female);
        assert_eq!(child.age_label(date(2024, 3, 10)), "2 months");

        child.date_of_birth = None;
        child.age_text = Some("about 6 months".to_string());
        assert_eq!(child.age_label(date(2024, 3, 10)), "about 6 months");

        child.age_text = None;
        assert_eq!(child.age_label(date(2024, 3, 10)), "Unknown age");
    }

    #[test]
    fn validation() {
        let mut child = Child::new("Mila", date(2024, 1, 10), Gender::Female);
        assert!(child.validate().is_ok());

        child.birth_weight = Some(Measurement::new(-1.0, "kg"));
        assert_eq!(child.validate().unwrap_err().field, "birthWeight");

        child.birth_weight = None;
        child.name = String::new();
        assert_eq!(child.validate().unwrap_err().field, "name");
    }
}
