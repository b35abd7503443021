//! Date values at the storage boundary.
//!
//! Dates are persisted as ISO-8601 strings in the `toISOString` layout
//! (`2024-03-14T00:00:00.000Z`). Years outside 0000-9999 use the expanded
//! form with a sign and six digits (`+010000-01-01T00:00:00.000Z`). Older data also holds date-only strings,
//! strings with offsets and epoch milliseconds, so reading is lenient while
//! writing is always canonical. A stored value that is not a date at all is
//! kept as it was: [`StoredDate::Unparsed`] in typed records, and a
//! [`DateIssue`] from [`marshal_dates`].

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub fn format_iso(value: &DateTime<Utc>) -> String {
    let year = value.year();
    if (0..=9999).contains(&year) {
        return value.format(ISO_FORMAT).to_string();
    }
    let sign = if year < 0 { '-' } else { '+' };
    format!(
        "{}{:06}{}",
        sign,
        year.unsigned_abs(),
        value.format("-%m-%dT%H:%M:%S%.3fZ")
    )
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// `±YYYYYY-MM-DDTHH:MM:SS.sssZ`. The rest of the value is parsed against a
/// leap placeholder year so Feb 29 survives until the real year is applied.
fn parse_expanded_year(raw: &str) -> Option<DateTime<Utc>> {
    let sign = match raw.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits = raw.get(1..7)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = sign * digits.parse::<i32>().ok()?;
    let rest = raw.get(7..)?;
    let rest = rest.strip_suffix('Z').unwrap_or(rest);
    parse_naive(&format!("2000{}", rest))?
        .with_year(year)
        .map(|value| value.and_utc())
}

/// Parses any of the layouts found in stored data. Naive values are UTC.
pub fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with(['+', '-']) {
        return parse_expanded_year(raw);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    parse_naive(raw).map(|value| value.and_utc())
}

/// A date field as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoredDate {
    Valid(DateTime<Utc>),
    /// The raw stored text, when it did not parse as a date.
    Unparsed(String),
}

impl StoredDate {
    pub fn parse(raw: &str) -> Self {
        match parse_iso(raw) {
            Some(value) => StoredDate::Valid(value),
            None => StoredDate::Unparsed(raw.to_string()),
        }
    }

    pub fn from_millis(millis: i64) -> Self {
        match DateTime::from_timestamp_millis(millis) {
            Some(value) => StoredDate::Valid(value),
            None => StoredDate::Unparsed(millis.to_string()),
        }
    }

    pub fn now() -> Self {
        StoredDate::Valid(Utc::now())
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            StoredDate::Valid(value) => Some(*value),
            StoredDate::Unparsed(_) => None,
        }
    }

    pub fn date_naive(&self) -> Option<NaiveDate> {
        self.as_datetime().map(|value| value.date_naive())
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, StoredDate::Valid(_))
    }

    /// The persisted form: canonical ISO for valid dates, the raw text otherwise.
    pub fn to_iso(&self) -> String {
        match self {
            StoredDate::Valid(value) => format_iso(value),
            StoredDate::Unparsed(raw) => raw.clone(),
        }
    }

    /// Formats a valid date with a chrono format string, or returns `fallback`.
    pub fn display_or(&self, format: &str, fallback: &str) -> String {
        match self {
            StoredDate::Valid(value) => value.format(format).to_string(),
            StoredDate::Unparsed(_) => fallback.to_string(),
        }
    }
}

impl From<DateTime<Utc>> for StoredDate {
    fn from(value: DateTime<Utc>) -> Self {
        StoredDate::Valid(value)
    }
}

impl From<NaiveDate> for StoredDate {
    fn from(value: NaiveDate) -> Self {
        match value.and_hms_opt(0, 0, 0) {
            Some(midnight) => StoredDate::Valid(midnight.and_utc()),
            None => StoredDate::Unparsed(value.to_string()),
        }
    }
}

impl fmt::Display for StoredDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

impl Serialize for StoredDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredDateRepr {
    Text(String),
    Millis(i64),
}

impl<'de> Deserialize<'de> for StoredDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredDateRepr::deserialize(deserializer)? {
            StoredDateRepr::Text(raw) => StoredDate::parse(&raw),
            StoredDateRepr::Millis(millis) => StoredDate::from_millis(millis),
        })
    }
}

/// A date field that could not be read as a date.
#[derive(Debug, Clone, PartialEq)]
pub struct DateIssue {
    pub field: String,
    pub value: Value,
}

/// Result of [`marshal_dates`]: the converted copy and the fields left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Marshalled {
    pub record: Value,
    pub issues: Vec<DateIssue>,
}

/// Returns a copy of `record` with every field in `fields` in canonical ISO form.
pub fn marshal_dates(record: &Value, fields: &[&str]) -> Marshalled {
    let mut record = record.clone();
    let issues = marshal_dates_in_place(&mut record, fields);
    Marshalled { record, issues }
}

/// In-place form of [`marshal_dates`]. Non-object records are left alone.
pub fn marshal_dates_in_place(record: &mut Value, fields: &[&str]) -> Vec<DateIssue> {
    let mut issues = Vec::new();
    let Some(object) = record.as_object_mut() else {
        return issues;
    };

    for field in fields {
        let Some(value) = object.get_mut(*field) else {
            continue;
        };
        let parsed = match value {
            Value::Null => continue,
            Value::String(raw) => parse_iso(raw),
            Value::Number(number) => number.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        };
        match parsed {
            Some(date) => {
                let canonical = format_iso(&date);
                if value.as_str() != Some(canonical.as_str()) {
                    *value = Value::String(canonical);
                }
            }
            None => issues.push(DateIssue {
                field: field.to_string(),
                value: value.clone(),
            }),
        }
    }
    issues
}
