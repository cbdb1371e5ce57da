//! Assertion runner: evaluates an ordered list of assertion entries against
//! a symbol table and produces a structured report.
//!
//! Entries are independent and evaluated strictly in input order; the
//! report's result order matches. An unknown assertion type is a fatal
//! lookup error that aborts the remaining entries in the run. A failed
//! assertion is data, recorded per entry, and the run continues.

pub mod eval;

use crate::symbols::SymbolTable;
use crate::template;
use chrono::Utc;
use serde_json::Value;
use specrun_types::{AssertKind, AssertionEntry, AssertionResult, RunReport, SpecError};
use specrun_util::display_string;
use tracing::debug;

/// Runs all entries and builds the report.
pub fn run(entries: &[AssertionEntry], table: &SymbolTable) -> Result<RunReport, SpecError> {
    let started_at = Utc::now();
    let mut results = Vec::with_capacity(entries.len());
    let mut failed = 0;

    for entry in entries {
        // Unknown types abort the run; entries before this one already ran.
        let kind: AssertKind = entry.kind.parse()?;

        let actual = template::deep_substitute(&entry.actual, table);
        let result = match eval::evaluate(kind, &actual, entry.expected.as_ref(), &entry.extra_fields) {
            Ok(true) => AssertionResult {
                kind: entry.kind.clone(),
                is_pass: true,
                message: render_message(entry, kind, &actual, true),
            },
            Ok(false) => AssertionResult {
                kind: entry.kind.clone(),
                is_pass: false,
                message: render_message(entry, kind, &actual, false),
            },
            Err(error) => AssertionResult {
                kind: entry.kind.clone(),
                is_pass: false,
                message: error.to_string(),
            },
        };

        if !result.is_pass {
            failed += 1;
        }
        results.push(result);
    }

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        total: results.len(),
        failed,
        results,
    };
    debug!(total = report.total, failed = report.failed, "assertion run finished");
    Ok(report)
}

/// Renders the entry's pass or fail message, preferring the authored
/// template. `{type}`, `{actual}`, and `{expected}` placeholders are
/// replaced with their display forms.
fn render_message(entry: &AssertionEntry, kind: AssertKind, actual: &Value, passed: bool) -> String {
    let template = if passed { &entry.pass_msg } else { &entry.fail_msg };
    let expected = entry
        .expected
        .as_ref()
        .map(display_string)
        .unwrap_or_else(|| "<none>".to_string());
    let actual = display_string(actual);

    match template {
        Some(text) => text
            .replace("{type}", kind.name())
            .replace("{actual}", &actual)
            .replace("{expected}", &expected),
        None if passed => format!("{kind} passed (actual: {actual}, expected: {expected})"),
        None => format!("{kind} failed (actual: {actual}, expected: {expected})"),
    }
}
