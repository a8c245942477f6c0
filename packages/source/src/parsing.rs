//! Shared helpers for reading raw Socrata record values.

use serde_json::Value;

/// Name of the nested point field carried by collision records.
pub const LOCATION_FIELD: &str = "location";

/// Replaces a nested object or array with its JSON text. Scalars are
/// returned unchanged.
#[must_use]
pub fn flatten_nested(value: Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
        scalar => scalar,
    }
}

/// Renders a value as a single text cell.
///
/// Strings are written verbatim, `null` as an empty cell, and everything
/// else in its JSON form.
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outcome of reading a count value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    /// The value is absent, `null`, or blank.
    Missing,
    /// The value is a whole number.
    Value(i64),
    /// The value is present but not a whole number.
    Invalid,
}

/// Parses a count from a JSON string or number.
///
/// Socrata serves numbers as strings (`"2"`); whole JSON numbers are also
/// accepted.
#[must_use]
pub fn parse_count(value: Option<&Value>) -> Count {
    match value {
        None | Some(Value::Null) => Count::Missing,
        Some(Value::String(s)) if s.trim().is_empty() => Count::Missing,
        Some(Value::String(s)) => s.trim().parse::<i64>().map_or(Count::Invalid, Count::Value),
        Some(Value::Number(n)) => n.as_i64().map_or(Count::Invalid, Count::Value),
        Some(_) => Count::Invalid,
    }
}
