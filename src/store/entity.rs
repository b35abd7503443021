use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const ID_FIELD: &str = "id";

/// Trait for records that can be stored in a collection.
pub trait Entity: Serialize + DeserializeOwned {}

// Blanket implementation for any type that meets the requirements
impl<T> Entity for T where T: Serialize + DeserializeOwned {}

/// The `id` of a raw record. Older data sometimes stored numeric ids
/// (`Date.now()`), those are compared by their decimal text.
pub fn record_id(record: &Value) -> Option<String> {
    id_field(record, ID_FIELD)
}

/// An id-valued `field` of a raw record, such as `childId`, read the same
/// way as [`record_id`].
pub fn id_field(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// Deserializes an id stored either as a string or as a number.
///
/// Use as `#[serde(deserialize_with = "id_from_string_or_number")]`.
pub fn id_from_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

pub fn has_id(record: &Value, id: &str) -> bool {
    field_has_id(record, ID_FIELD, id)
}

pub fn field_has_id(record: &Value, field: &str, id: &str) -> bool {
    match record.get(field) {
        Some(Value::String(value)) => value == id,
        Some(Value::Number(value)) => value.to_string() == id,
        _ => false,
    }
}
