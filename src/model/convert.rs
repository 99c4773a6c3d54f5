//! Converters from raw service values to typed attributes.
//!
//! The service encodes almost everything as strings: counts are `"1234"`,
//! flags are `"0"`/`"1"`, dates come in a couple of textual formats. Each
//! converter accepts the raw [`Value`] and either the typed value or a
//! message describing why it did not fit.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Converter outcome; the error is a human-readable reason.
pub type Converted<T> = Result<T, String>;

/// Date-time formats seen in responses, besides RFC 2822.
const DATETIME_FORMATS: &[&str] = &["%d %b %Y, %H:%M", "%d %b %Y %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Date-only formats seen in responses.
const DATE_FORMATS: &[&str] = &["%d %b %Y", "%Y-%m-%d"];

/// Trimmed string. Numbers are accepted and rendered as text.
pub fn text(value: &Value) -> Converted<String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(format!("expected text, got {other}")),
    }
}

/// Integer, from a number or a numeric string.
pub fn integer<T>(value: &Value) -> Converted<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => return Err(format!("expected an integer, got {other}")),
    };
    raw.parse::<T>()
        .map_err(|e| format!("{raw:?} is not an integer: {e}"))
}

/// Floating point number, from a number or a numeric string.
pub fn float(value: &Value) -> Converted<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is out of range")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|e| format!("{s:?} is not a number: {e}")),
        other => Err(format!("expected a number, got {other}")),
    }
}

/// Boolean flag: `"1"`/`"0"` (any integer, non-zero is true), `"true"`/`"false"`,
/// or a JSON boolean.
pub fn flag(value: &Value) -> Converted<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
        other => integer::<i64>(other).map(|n| n != 0),
    }
}

/// Timestamp in one of the service's formats, as UTC.
pub fn datetime(value: &Value) -> Converted<DateTime<Utc>> {
    let raw = text(value)?;
    parse_datetime(&raw).ok_or_else(|| format!("unrecognized timestamp {raw:?}"))
}

/// Calendar date in one of the service's formats. Time-of-day is dropped.
pub fn date(value: &Value) -> Converted<NaiveDate> {
    let raw = text(value)?;
    if let Some(dt) = parse_datetime(&raw) {
        return Ok(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&raw, fmt).ok())
        .ok_or_else(|| format!("unrecognized date {raw:?}"))
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Convert a list element-wise. A lone object is treated as a one-element
/// list, which is how the service encodes single results.
pub fn list<T>(value: &Value, element: impl Fn(&Value) -> Converted<T>) -> Converted<Vec<T>> {
    match value {
        Value::Array(items) => items.iter().map(element).collect(),
        Value::Object(_) => element(value).map(|item| vec![item]),
        other => Err(format!("expected a list, got {other}")),
    }
}

/// Convert the list nested under `key` in a wrapper object, e.g.
/// `{"tag": [...]}`. A wrapper without the key is an empty list.
pub fn nested_list<T>(
    value: &Value,
    key: &str,
    element: impl Fn(&Value) -> Converted<T>,
) -> Converted<Vec<T>> {
    match value {
        Value::Object(wrapper) => match wrapper.get(key) {
            Some(inner) if !inner.is_null() && inner != "" => list(inner, element),
            _ => Ok(Vec::new()),
        },
        // An empty wrapper sometimes arrives as a bare string
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        other => Err(format!("expected an object with {key:?}, got {other}")),
    }
}
