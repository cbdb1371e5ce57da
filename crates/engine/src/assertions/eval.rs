//! Pure evaluator functions for each assertion kind.
//!
//! Every evaluator takes the (already substituted) actual value, the
//! optional expected value, and the entry's extra fields, and returns
//! `Ok(bool)` or a `SpecError::Validation` when the inputs are structurally
//! inapplicable to the kind. A validation error is not the same thing as a
//! false result; the runner records it as a failed entry with the error text.

use regex::Regex;
use serde_json::{Map, Value};
use specrun_types::{AssertKind, SpecError};
use specrun_util::display_string;

/// Dispatches an assertion kind to its evaluator. Exhaustive by construction.
pub fn evaluate(kind: AssertKind, actual: &Value, expected: Option<&Value>, extra: &Map<String, Value>) -> Result<bool, SpecError> {
    match kind {
        AssertKind::Equal => Ok(loose_eq(actual, required(kind, expected)?)),
        AssertKind::NotEqual => Ok(!loose_eq(actual, required(kind, expected)?)),
        AssertKind::GreaterThan => numeric_cmp(kind, actual, expected, |a, e| a > e),
        AssertKind::GreaterThanOrEqual => numeric_cmp(kind, actual, expected, |a, e| a >= e),
        AssertKind::LessThan => numeric_cmp(kind, actual, expected, |a, e| a < e),
        AssertKind::LessThanOrEqual => numeric_cmp(kind, actual, expected, |a, e| a <= e),
        AssertKind::Between => between(actual, extra),
        AssertKind::Contains => contains(actual, required(kind, expected)?),
        AssertKind::NotContains => contains(actual, required(kind, expected)?).map(|found| !found),
        AssertKind::IsTrue => boolean(kind, actual, true),
        AssertKind::IsFalse => boolean(kind, actual, false),
        AssertKind::IsNull => Ok(actual.is_null()),
        AssertKind::IsNotNull => Ok(!actual.is_null()),
        AssertKind::HasKey => has_key(actual, required(kind, expected)?),
        AssertKind::HasLength => has_length(actual, expected, extra),
        AssertKind::Matches => matches_pattern(actual, required(kind, expected)?),
    }
}

fn required(kind: AssertKind, expected: Option<&Value>) -> Result<&Value, SpecError> {
    expected.ok_or_else(|| SpecError::Validation(format!("{kind} requires an 'expected' value")))
}

/// Equality that treats numerically equal numbers as equal regardless of
/// integer/float representation.
fn loose_eq(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(e)) => a == e,
        _ => actual == expected,
    }
}

fn numeric_cmp(
    kind: AssertKind,
    actual: &Value,
    expected: Option<&Value>,
    compare: impl Fn(f64, f64) -> bool,
) -> Result<bool, SpecError> {
    let expected = required(kind, expected)?;
    let a = as_number(kind, "actual", actual)?;
    let e = as_number(kind, "expected", expected)?;
    Ok(compare(a, e))
}

fn as_number(kind: AssertKind, field: &str, value: &Value) -> Result<f64, SpecError> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|text| text.parse().ok()))
        .ok_or_else(|| SpecError::Validation(format!("{kind} requires a numeric '{field}', got {value}")))
}

fn between(actual: &Value, extra: &Map<String, Value>) -> Result<bool, SpecError> {
    let kind = AssertKind::Between;
    let min = extra
        .get("min")
        .ok_or_else(|| SpecError::Validation("Between requires a 'min' field".into()))?;
    let max = extra
        .get("max")
        .ok_or_else(|| SpecError::Validation("Between requires a 'max' field".into()))?;

    let a = as_number(kind, "actual", actual)?;
    let lo = as_number(kind, "min", min)?;
    let hi = as_number(kind, "max", max)?;
    Ok(lo <= a && a <= hi)
}

fn contains(actual: &Value, expected: &Value) -> Result<bool, SpecError> {
    match actual {
        Value::String(haystack) => Ok(haystack.contains(&display_string(expected))),
        Value::Array(items) => Ok(items.iter().any(|item| loose_eq(item, expected))),
        Value::Object(map) => {
            let key = expected
                .as_str()
                .ok_or_else(|| SpecError::Validation(format!("Contains on a mapping requires a string key, got {expected}")))?;
            Ok(map.contains_key(key))
        }
        other => Err(SpecError::Validation(format!(
            "Contains requires a string, sequence, or mapping 'actual', got {other}"
        ))),
    }
}

fn boolean(kind: AssertKind, actual: &Value, want: bool) -> Result<bool, SpecError> {
    let flag = actual
        .as_bool()
        .ok_or_else(|| SpecError::Validation(format!("{kind} requires a boolean 'actual', got {actual}")))?;
    Ok(flag == want)
}

fn has_key(actual: &Value, expected: &Value) -> Result<bool, SpecError> {
    let map = actual
        .as_object()
        .ok_or_else(|| SpecError::Validation(format!("HasKey requires a mapping 'actual', got {actual}")))?;
    let key = expected
        .as_str()
        .ok_or_else(|| SpecError::Validation(format!("HasKey requires a string 'expected', got {expected}")))?;
    Ok(map.contains_key(key))
}

fn has_length(actual: &Value, expected: Option<&Value>, extra: &Map<String, Value>) -> Result<bool, SpecError> {
    let declared = expected
        .or_else(|| extra.get("length"))
        .ok_or_else(|| SpecError::Validation("HasLength requires an 'expected' or 'length' value".into()))?;
    let want = as_number(AssertKind::HasLength, "length", declared)? as usize;

    let got = match actual {
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => {
            return Err(SpecError::Validation(format!(
                "HasLength requires a string, sequence, or mapping 'actual', got {other}"
            )));
        }
    };
    Ok(got == want)
}

fn matches_pattern(actual: &Value, expected: &Value) -> Result<bool, SpecError> {
    let text = actual
        .as_str()
        .ok_or_else(|| SpecError::Validation(format!("Matches requires a string 'actual', got {actual}")))?;
    let pattern = expected
        .as_str()
        .ok_or_else(|| SpecError::Validation(format!("Matches requires a string pattern, got {expected}")))?;
    let re = Regex::new(pattern).map_err(|error| SpecError::Validation(format!("invalid pattern '{pattern}': {error}")))?;
    Ok(re.is_match(text))
}
