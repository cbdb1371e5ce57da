//! Template substitution over `<% ... %>` tokens.
//!
//! Substitution is a pure function of its inputs and is idempotent: a value
//! with no remaining tokens substitutes to itself, and resolved values are
//! never rescanned for further expansion. There is no caching.
//!
//! Two substitution modes exist:
//!
//! - **Whole-value**: input that is exactly one token with no surrounding
//!   literal text yields the raw resolved value, preserving its type.
//! - **Partial**: tokens embedded in literal text are replaced by their
//!   display-string form; unresolved tokens keep their literal source text.

use crate::symbols::SymbolTable;
use serde_json::Value;
use specrun_util::{display_string, is_falsy};

const TOKEN_OPEN: &str = "<%";
const TOKEN_CLOSE: &str = "%>";

/// One parsed piece of a templated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text outside any token.
    Literal(String),
    /// A `<% ... %>` token.
    Token {
        /// Trimmed dot-path expression inside the delimiters.
        path: String,
        /// Original source text including delimiters, restored verbatim when
        /// the token does not resolve.
        raw: String,
    },
}

/// Splits text into alternating literal and token fragments.
///
/// An opening delimiter without a matching close leaves the remainder as
/// literal text.
pub fn parse_fragments(text: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut remainder = text;

    while let Some(start) = remainder.find(TOKEN_OPEN) {
        let (before, after_open) = remainder.split_at(start);
        if !before.is_empty() {
            fragments.push(Fragment::Literal(before.to_string()));
        }

        let inner_start = &after_open[TOKEN_OPEN.len()..];
        let Some(end) = inner_start.find(TOKEN_CLOSE) else {
            fragments.push(Fragment::Literal(after_open.to_string()));
            return fragments;
        };

        let raw = &after_open[..TOKEN_OPEN.len() + end + TOKEN_CLOSE.len()];
        fragments.push(Fragment::Token {
            path: inner_start[..end].trim().to_string(),
            raw: raw.to_string(),
        });
        remainder = &inner_start[end + TOKEN_CLOSE.len()..];
    }

    if !remainder.is_empty() {
        fragments.push(Fragment::Literal(remainder.to_string()));
    }
    fragments
}

/// True when the text contains at least one well-formed token.
pub fn has_tokens(text: &str) -> bool {
    parse_fragments(text)
        .iter()
        .any(|fragment| matches!(fragment, Fragment::Token { .. }))
}

/// True when any string leaf of the value contains a token.
pub fn value_has_tokens(value: &Value) -> bool {
    match value {
        Value::String(text) => has_tokens(text),
        Value::Array(items) => items.iter().any(value_has_tokens),
        Value::Object(map) => map.values().any(value_has_tokens),
        _ => false,
    }
}

/// Looks a token path up in the table, returning the raw value when found.
pub fn resolve_token(path: &str, table: &SymbolTable) -> Option<Value> {
    table.get(path).cloned()
}

/// Substitutes tokens in a string against the table.
///
/// Whole-value substitution preserves the resolved value's type. A resolved
/// value that is falsy (empty string, zero, false, null) leaves the token
/// literal, the same as an unresolved token; callers cannot distinguish the
/// two cases. Partial substitution splices display-string forms into the
/// surrounding literal text, leaving unresolved tokens as their source text.
pub fn substitute(text: &str, table: &SymbolTable) -> Value {
    let fragments = parse_fragments(text);

    if let [Fragment::Token { path, .. }] = fragments.as_slice() {
        return match resolve_token(path, table) {
            Some(value) if !is_falsy(&value) => value,
            _ => Value::String(text.to_string()),
        };
    }

    if !fragments.iter().any(|fragment| matches!(fragment, Fragment::Token { .. })) {
        return Value::String(text.to_string());
    }

    let mut output = String::with_capacity(text.len());
    for fragment in &fragments {
        match fragment {
            Fragment::Literal(literal) => output.push_str(literal),
            Fragment::Token { path, raw } => match resolve_token(path, table) {
                Some(value) => output.push_str(&display_string(&value)),
                None => output.push_str(raw),
            },
        }
    }
    Value::String(output)
}

/// Recurses through nested mappings and sequences, substituting string
/// leaves. Non-string, non-container leaves pass through unchanged.
pub fn deep_substitute(value: &Value, table: &SymbolTable) -> Value {
    match value {
        Value::String(text) => substitute(text, table),
        Value::Array(items) => Value::Array(items.iter().map(|item| deep_substitute(item, table)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, nested)| (key.clone(), deep_substitute(nested, table)))
                .collect(),
        ),
        other => other.clone(),
    }
}
