//! Document execution: populates the symbol table, runs the type-specific
//! payload, binds runtime outputs, and renders the exposed values.
//!
//! All state lives in the per-execution [`ExecutionContext`] and the local
//! symbol table; nothing survives across independent executions.

use crate::symbols::SymbolTable;
use crate::template;
use crate::transport::FetchTransport;
use crate::workflow;
use crate::{assertions, expose};
use serde::Serialize;
use serde_json::{Map, Value};
use specrun_http::compile_request;
use specrun_types::{DocPayload, ExposedValue, RequestSpec, RunReport, SpecDocument, SpecError, WorkflowReport};
use std::path::PathBuf;
use tracing::debug;

/// Inputs for one document execution, passed by parameter through every
/// call; there is no process-wide execution state.
pub struct ExecutionContext<'t> {
    /// Directory against which relative `file` references resolve.
    pub base_dir: PathBuf,
    /// Externally supplied override variables (CLI or parent workflow).
    pub overrides: Map<String, Value>,
    /// Transport used for fetch documents.
    pub transport: &'t dyn FetchTransport,
}

impl<'t> ExecutionContext<'t> {
    pub fn new(base_dir: impl Into<PathBuf>, transport: &'t dyn FetchTransport) -> Self {
        Self {
            base_dir: base_dir.into(),
            overrides: Map::new(),
            transport,
        }
    }

    pub fn with_overrides(mut self, overrides: Map<String, Value>) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Result of one document execution, ready for presentation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum DocumentOutcome {
    Fetch {
        exposed: Vec<ExposedValue>,
        response: Value,
    },
    Validate {
        report: RunReport,
        exposed: Vec<ExposedValue>,
    },
    Workflow {
        report: WorkflowReport,
    },
}

impl DocumentOutcome {
    /// Exposed values for chaining; workflows expose nothing themselves.
    pub fn exposed(&self) -> &[ExposedValue] {
        match self {
            DocumentOutcome::Fetch { exposed, .. } | DocumentOutcome::Validate { exposed, .. } => exposed,
            DocumentOutcome::Workflow { .. } => &[],
        }
    }

    /// True when nothing failed: all assertions passed and, for workflows,
    /// every task completed.
    pub fn is_pass(&self) -> bool {
        match self {
            DocumentOutcome::Fetch { .. } => true,
            DocumentOutcome::Validate { report, .. } => report.is_pass(),
            DocumentOutcome::Workflow { report } => report.is_pass(),
        }
    }
}

/// Parses and executes an already-deserialized document mapping.
pub fn execute_value(raw: &Value, ctx: &ExecutionContext) -> Result<DocumentOutcome, SpecError> {
    let document = SpecDocument::from_value(raw)?;
    execute_document(&document, ctx)
}

/// Executes a parsed document.
pub fn execute_document(document: &SpecDocument, ctx: &ExecutionContext) -> Result<DocumentOutcome, SpecError> {
    debug!(version = %document.version, kind = %document.kind(), "executing document");

    let mut table = SymbolTable::with_process_env();
    table.insert_declared(&document.variables)?;
    table.apply_overrides(&ctx.overrides);

    match &document.payload {
        DocPayload::Fetch { request } => execute_fetch(document, request, table, ctx),
        DocPayload::Validate { asserts, data } => execute_validate(document, asserts, data, table),
        DocPayload::Workflow { tasks } => workflow::execute_workflow(document, tasks, ctx),
    }
}

fn execute_fetch(
    document: &SpecDocument,
    request: &Value,
    mut table: SymbolTable,
    ctx: &ExecutionContext,
) -> Result<DocumentOutcome, SpecError> {
    let substituted = template::deep_substitute(request, &table);
    let spec: RequestSpec =
        serde_json::from_value(substituted).map_err(|error| SpecError::Document(format!("invalid 'request' block: {error}")))?;
    let compiled = compile_request(&spec)?;

    let response = ctx.transport.send(&compiled)?;
    let response_value = response.to_value();
    table.bind_output("_response", response_value.clone());

    let exposed = expose::render(&document.expose, &table);
    Ok(DocumentOutcome::Fetch {
        exposed,
        response: response_value,
    })
}

fn execute_validate(
    document: &SpecDocument,
    asserts: &[specrun_types::AssertionEntry],
    data: &Value,
    mut table: SymbolTable,
) -> Result<DocumentOutcome, SpecError> {
    let data = template::deep_substitute(data, &table);
    table.bind_output("_data", data);

    let report = assertions::run(asserts, &table)?;
    let exposed = expose::render(&document.expose, &table);
    Ok(DocumentOutcome::Validate { report, exposed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::NoopTransport;
    use serde_json::json;

    fn ctx(transport: &dyn FetchTransport) -> ExecutionContext<'_> {
        ExecutionContext::new(".", transport)
    }

    #[test]
    fn fetch_document_binds_response_and_exposes_values() {
        let raw = json!({
            "version": "default:http:0.7.2",
            "variables": {"host": "https://api.example.com"},
            "request": {"url": "<% host %>/apps", "method": "GET"},
            "expose": [
                {"code": "<% _response.code %>"},
                "<% _response.data.url %>"
            ]
        });

        let transport = NoopTransport;
        let outcome = execute_value(&raw, &ctx(&transport)).expect("execute");

        let exposed = outcome.exposed();
        assert_eq!(exposed[0].label, "code");
        assert_eq!(exposed[0].value, json!(200));
        assert_eq!(exposed[1].label, "1");
        assert_eq!(exposed[1].value, json!("https://api.example.com/apps"));
    }

    #[test]
    fn validate_document_runs_assertions_against_bound_data() {
        let raw = json!({
            "version": "default:validation:0.7.2",
            "variables": {"expected_code": 201},
            "data": {"code": 201, "name": "demo"},
            "asserts": [
                {"type": "Equal", "actual": "<% _data.code %>", "expected": "<% expected_code %>"},
                {"type": "Contains", "actual": "<% _data.name %>", "expected": "dem"}
            ]
        });

        let transport = NoopTransport;
        let outcome = execute_value(&raw, &ctx(&transport)).expect("execute");
        let DocumentOutcome::Validate { report, .. } = &outcome else {
            panic!("expected validate outcome");
        };
        // 'expected' is authored literally; only 'actual' is substituted.
        // The first entry compares the substituted actual (201) with the
        // literal template string, so it fails; the second passes.
        assert_eq!(report.total, 2);
        assert!(!report.results[0].is_pass);
        assert!(report.results[1].is_pass);
    }

    #[test]
    fn overrides_take_precedence_over_document_variables() {
        let raw = json!({
            "version": "default:http:0.7.2",
            "variables": {"host": "https://declared.test"},
            "request": {"url": "<% host %>/x"},
            "expose": ["<% _response.data.url %>"]
        });

        let transport = NoopTransport;
        let overrides = json!({"host": "https://override.test"}).as_object().unwrap().clone();
        let context = ctx(&transport).with_overrides(overrides);

        let outcome = execute_value(&raw, &context).expect("execute");
        assert_eq!(outcome.exposed()[0].value, json!("https://override.test/x"));
    }

    #[test]
    fn validation_phase_errors_abort_before_the_transport_is_called() {
        use std::cell::Cell;

        struct CountingTransport(Cell<usize>);
        impl FetchTransport for CountingTransport {
            fn send(&self, request: &specrun_http::CompiledRequest) -> Result<specrun_http::FetchResponse, SpecError> {
                self.0.set(self.0.get() + 1);
                NoopTransport.send(request)
            }
        }

        let raw = json!({
            "version": "default:http:0.7.2",
            "variables": {"_bad_name": 1},
            "request": {"url": "https://x.test"}
        });

        let transport = CountingTransport(Cell::new(0));
        let error = execute_value(&raw, &ctx(&transport)).expect_err("naming error");
        assert!(matches!(error, SpecError::VariableNaming(_)));
        assert_eq!(transport.0.get(), 0, "transport must not be called");
    }
}
