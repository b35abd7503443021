//! The persisted layout of a key.
//!
//! Collections: `{"schemaVersion": N, "records": [...]}`.
//! Single values: `{"schemaVersion": N, "value": ...}`.
//! Anything written before versioning is the bare JSON and reads as version 0.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION_FIELD: &str = "schemaVersion";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEnvelope {
    pub schema_version: u32,
    pub records: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueEnvelope {
    pub schema_version: u32,
    pub value: Value,
}

pub fn decode_collection(bytes: &[u8]) -> Result<(u32, Vec<Value>), String> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    match value {
        Value::Array(records) => Ok((0, records)),
        Value::Object(object) if object.contains_key(SCHEMA_VERSION_FIELD) => {
            let envelope: CollectionEnvelope =
                serde_json::from_value(Value::Object(object)).map_err(|e| e.to_string())?;
            Ok((envelope.schema_version, envelope.records))
        }
        other => Err(format!("expected a collection, found {}", kind(&other))),
    }
}

pub fn decode_value(bytes: &[u8]) -> Result<(u32, Value), String> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    let is_envelope = value.as_object().is_some_and(|object| {
        object.len() == 2
            && object.get(SCHEMA_VERSION_FIELD).is_some_and(Value::is_u64)
            && object.contains_key("value")
    });
    if is_envelope {
        let envelope: ValueEnvelope = serde_json::from_value(value).map_err(|e| e.to_string())?;
        Ok((envelope.schema_version, envelope.value))
    } else {
        Ok((0, value))
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
