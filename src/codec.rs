//! Document encoding for the key-value store.
//!
//! Documents are stored as JSON text with two conventions layered on top of
//! plain JSON, both required for interop with previously persisted data:
//!
//! - `DateTime<Utc>` values are written as ISO-8601 strings in the exact
//!   `YYYY-MM-DDTHH:mm:ss.sssZ` shape and parsed back strictly from it.
//! - Cleared optional fields are written as the literal string `"undefined"`
//!   instead of being dropped. Plain JSON would omit the key entirely, which
//!   makes "clear this field" indistinguishable from "never set".

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};

/// Exact persisted shape of every timestamp: millisecond precision, `Z` suffix.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Marker stored in place of a cleared optional field.
pub const UNDEFINED: &str = "undefined";

pub fn format_date(value: &DateTime<Utc>) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    // 24 chars: "2024-01-02T03:04:05.678Z". Reject anything looser so that
    // ordinary strings never round-trip into dates by accident.
    if raw.len() != 24 || !raw.ends_with('Z') {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serialize a whole record to its stored string form.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a stored string back into a typed record.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Serialize a record into a JSON object so field names can be inspected.
pub fn to_document<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Io(format!(
            "expected a JSON object document, got {other}"
        ))),
    }
}

/// Rebuild a typed record from a JSON object document.
pub fn from_document<T: DeserializeOwned>(doc: Map<String, Value>) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// The stored form of a cleared optional field, for building update patches.
pub fn undefined_value() -> Value {
    Value::String(UNDEFINED.to_string())
}

/// The stored form of a timestamp, for building update patches.
pub fn date_value(value: &DateTime<Utc>) -> Value {
    Value::String(format_date(value))
}

/// Serde adapter for required `DateTime<Utc>` fields.
pub mod date {
    use super::*;

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, ser: S) -> std::result::Result<S::Ok, S::Error> {
        ser.serialize_str(&format_date(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(de)?;
        parse_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stored date: {raw}")))
    }
}

/// Serde adapter for optional `DateTime<Utc>` fields (`None` ⇄ `"undefined"`).
pub mod opt_date {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        ser: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(dt) => ser.serialize_str(&format_date(dt)),
            None => ser.serialize_str(UNDEFINED),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        de: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(de)? {
            None => Ok(None),
            Some(raw) if raw == UNDEFINED => Ok(None),
            Some(raw) => parse_date(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid stored date: {raw}"))),
        }
    }
}

/// Serde adapter for any other optional field (`None` ⇄ `"undefined"`).
pub mod undef {
    use super::*;

    pub fn serialize<T, S>(value: &Option<T>, ser: S) -> std::result::Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(ser),
            None => ser.serialize_str(UNDEFINED),
        }
    }

    pub fn deserialize<'de, T, D>(de: D) -> std::result::Result<Option<T>, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        match Value::deserialize(de)? {
            Value::Null => Ok(None),
            Value::String(raw) if raw == UNDEFINED => Ok(None),
            other => serde_json::from_value(other)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
