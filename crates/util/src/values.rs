//! Display-string formatting and truthiness rules for JSON values.

use serde_json::Value;

/// Formats a JSON value in its display-string form, used when a template
/// token is spliced into surrounding literal text.
///
/// Strings are returned bare, scalars via their canonical string form, and
/// null as an empty string. Containers render as compact JSON
/// (`["a","b"]`, `{"k":"v"}`) — the one display shape used everywhere a
/// sequence or mapping lands inside a longer string.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        container => container.to_string(),
    }
}

/// Truthiness used by whole-value template substitution: empty string, zero,
/// `false`, and null are falsy. Containers are always truthy, even empty.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().map(|n| n == 0.0).unwrap_or(false),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
