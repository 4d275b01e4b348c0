//! Lenient field decoders for backend payloads.
//!
//! The backend is loose about shapes: timestamps arrive as RFC 3339 or as
//! `Y-m-d H:i:s`, amounts as numbers or decimal strings. A field that still
//! cannot be decoded is dropped with a warning so the rest of the record
//! survives.
//!
//! Every decoder is meant for `#[serde(default, deserialize_with = "...")]`,
//! so a missing key keeps the field's default.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::patch::Patch;

/// Offset-less layouts, read as UTC.
const NAIVE_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse RFC 3339, `Y-m-d H:i:s` or a bare `Y-m-d`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// A JSON number, or a string holding one.
pub fn parse_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decode_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let parsed = value.as_str().and_then(parse_timestamp);
    if parsed.is_none() {
        warn!(value = %value, "Dropping undecodable timestamp");
    }
    parsed
}

fn decode<T: DeserializeOwned>(value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(
                target_type = std::any::type_name::<T>(),
                error = %e,
                "Dropping undecodable field"
            );
            None
        }
    }
}

/// `Option<DateTime<Utc>>` in any accepted layout.
pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        value => decode_timestamp(&value),
    })
}

/// Nullable timestamp in a partial. An unreadable value leaves the field
/// untouched rather than clearing it.
pub fn timestamp_patch<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Patch<DateTime<Utc>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => Patch::Clear,
        value => decode_timestamp(&value).map_or(Patch::Absent, Patch::Set),
    })
}

/// Amount sent as a number or a decimal string.
pub fn decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        value => {
            let parsed = parse_decimal(&value);
            if parsed.is_none() {
                warn!(value = %value, "Dropping undecodable amount");
            }
            parsed
        }
    })
}

/// Any optional field; `null` and unreadable values both yield `None`.
pub fn optional<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        value => decode(value),
    })
}

/// Any nullable field of a partial. An unreadable value becomes `Absent`.
pub fn patch<'de, D, T>(d: D) -> Result<Patch<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Null => Patch::Clear,
        value => decode(value).map_or(Patch::Absent, Patch::Set),
    })
}

/// A list where each unreadable element is dropped on its own.
pub fn items<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Null => None,
        Value::Array(values) => Some(values.into_iter().filter_map(decode::<T>).collect()),
        other => {
            warn!(value = %other, "Dropping list field that is not an array");
            None
        }
    })
}

/// [`items`] for the snapshot's shared collections.
pub fn shared_items<'de, D, T>(d: D) -> Result<Arc<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    items(d).map(|list| Arc::new(list.unwrap_or_default()))
}
