//! Assertion entries, the closed set of assertion kinds, and run reports.

use crate::error::SpecError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Closed set of supported assertion kinds.
///
/// Dispatch is an exhaustive match on this enum; there is no reflective or
/// string-based method lookup anywhere in the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssertKind {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Between,
    Contains,
    NotContains,
    IsTrue,
    IsFalse,
    IsNull,
    IsNotNull,
    HasKey,
    HasLength,
    Matches,
}

impl AssertKind {
    /// Canonical display name, as written in documents.
    pub fn name(&self) -> &'static str {
        match self {
            AssertKind::Equal => "Equal",
            AssertKind::NotEqual => "NotEqual",
            AssertKind::GreaterThan => "GreaterThan",
            AssertKind::GreaterThanOrEqual => "GreaterThanOrEqual",
            AssertKind::LessThan => "LessThan",
            AssertKind::LessThanOrEqual => "LessThanOrEqual",
            AssertKind::Between => "Between",
            AssertKind::Contains => "Contains",
            AssertKind::NotContains => "NotContains",
            AssertKind::IsTrue => "IsTrue",
            AssertKind::IsFalse => "IsFalse",
            AssertKind::IsNull => "IsNull",
            AssertKind::IsNotNull => "IsNotNull",
            AssertKind::HasKey => "HasKey",
            AssertKind::HasLength => "HasLength",
            AssertKind::Matches => "Matches",
        }
    }
}

impl FromStr for AssertKind {
    type Err = SpecError;

    /// Accepts both `PascalCase` and `snake_case` spellings.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw.chars().filter(|c| *c != '_').collect::<String>().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "equal" | "equals" => AssertKind::Equal,
            "notequal" | "notequals" => AssertKind::NotEqual,
            "greaterthan" => AssertKind::GreaterThan,
            "greaterthanorequal" => AssertKind::GreaterThanOrEqual,
            "lessthan" => AssertKind::LessThan,
            "lessthanorequal" => AssertKind::LessThanOrEqual,
            "between" => AssertKind::Between,
            "contains" => AssertKind::Contains,
            "notcontains" => AssertKind::NotContains,
            "istrue" => AssertKind::IsTrue,
            "isfalse" => AssertKind::IsFalse,
            "isnull" => AssertKind::IsNull,
            "isnotnull" => AssertKind::IsNotNull,
            "haskey" => AssertKind::HasKey,
            "haslength" => AssertKind::HasLength,
            "matches" => AssertKind::Matches,
            _ => return Err(SpecError::AssertionType(raw.to_string())),
        };
        Ok(kind)
    }
}

impl fmt::Display for AssertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One assertion as declared in a validate document.
///
/// Created by parsing the `asserts` list, mutated once when `actual` is
/// substituted against the symbol table, and consumed exactly once by the
/// assertion runner. `kind` stays a raw string until the runner looks it up
/// so that earlier entries in the same run still execute before an unknown
/// type aborts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionEntry {
    /// Assertion type name, resolved against [`AssertKind`] by the runner.
    #[serde(rename = "type")]
    pub kind: String,

    /// Raw actual expression, possibly templated.
    pub actual: Value,

    /// Optional expected value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,

    /// Message template rendered on success. `{actual}`, `{expected}`, and
    /// `{type}` placeholders are substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_msg: Option<String>,

    /// Message template rendered on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_msg: Option<String>,

    /// Parameter fields for parameterized assertions (e.g. `min`/`max` for
    /// `Between`, `length` for `HasLength`).
    #[serde(flatten, default)]
    pub extra_fields: Map<String, Value>,
}

/// Outcome of a single assertion entry.
#[derive(Debug, Clone, Serialize)]
pub struct AssertionResult {
    /// Assertion type name as declared.
    pub kind: String,
    /// Whether the assertion passed.
    pub is_pass: bool,
    /// Rendered pass/fail message.
    pub message: String,
}

/// Aggregate report for one assertion run. Immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Total number of evaluated entries.
    pub total: usize,
    /// Number of failed entries.
    pub failed: usize,
    /// Per-entry results, in input order.
    pub results: Vec<AssertionResult>,
}

impl RunReport {
    /// True when every evaluated entry passed.
    pub fn is_pass(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_parses_pascal_and_snake_case() {
        assert_eq!("Equal".parse::<AssertKind>().unwrap(), AssertKind::Equal);
        assert_eq!("not_equal".parse::<AssertKind>().unwrap(), AssertKind::NotEqual);
        assert_eq!("greater_than_or_equal".parse::<AssertKind>().unwrap(), AssertKind::GreaterThanOrEqual);
    }

    #[test]
    fn unknown_kind_is_an_assertion_type_error() {
        let error = "Frobnicate".parse::<AssertKind>().expect_err("unknown");
        assert!(matches!(error, SpecError::AssertionType(name) if name == "Frobnicate"));
    }

    #[test]
    fn entry_captures_extra_fields() {
        let entry: AssertionEntry = serde_json::from_value(json!({
            "type": "Between",
            "actual": "<% _data.count %>",
            "min": 1,
            "max": 10
        }))
        .expect("deserialize");

        assert_eq!(entry.kind, "Between");
        assert_eq!(entry.extra_fields.get("min"), Some(&json!(1)));
        assert_eq!(entry.extra_fields.get("max"), Some(&json!(10)));
    }
}
