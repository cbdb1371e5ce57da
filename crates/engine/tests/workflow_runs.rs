//! End-to-end workflow execution against documents on disk.

use serde_json::{Value, json};
use specrun_engine::{DocumentOutcome, ExecutionContext, FetchTransport, execute_file};
use specrun_http::{CompiledRequest, FetchResponse};
use specrun_types::SpecError;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;

/// Transport stub that records every URL it is asked to fetch and replies
/// with a fixed status and body.
struct RecordingTransport {
    calls: RefCell<Vec<String>>,
    code: u16,
    body: Value,
    fail: Cell<bool>,
}

impl RecordingTransport {
    fn replying(code: u16, body: Value) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            code,
            body,
            fail: Cell::new(false),
        }
    }

    fn failing() -> Self {
        let mut transport = Self::replying(0, Value::Null);
        transport.fail = Cell::new(true);
        transport
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl FetchTransport for RecordingTransport {
    fn send(&self, request: &CompiledRequest) -> Result<FetchResponse, SpecError> {
        self.calls.borrow_mut().push(request.url.to_string());
        if self.fail.get() {
            return Err(SpecError::Transport("connection refused".into()));
        }
        Ok(FetchResponse {
            code: self.code,
            headers: Default::default(),
            data: self.body.clone(),
            elapsed_ms: 1,
        })
    }
}

fn write(path: &Path, content: &str) {
    fs::write(path, content).expect("write fixture");
}

fn create_app_doc() -> &'static str {
    r#"
version: default:http:0.7.2
variables:
  host: https://api.example.com
request:
  url: "<% host %>/apps"
  method: POST
  body:
    json:
      name: "<% app_name %>"
expose:
  - code: "<% _response.code %>"
  - id: "<% _response.data.id %>"
"#
}

fn check_code_doc() -> &'static str {
    r#"
version: default:validation:0.7.2
data:
  observed: "<% prev_code %>"
asserts:
  - type: Equal
    actual: "<% _data.observed %>"
    expected: 201
expose:
  - ok: "<% _data.observed %>"
"#
}

fn workflow_doc() -> &'static str {
    r#"
version: default:workflow:0.8.0
id: smoke
tasks:
  - name: create
    uses: fetch
    file: create_app.yaml
    variables:
      app_name: demo
  - name: check
    uses: validate
    file: check_code.yaml
    variables:
      prev_code: "<% _steps.create.code %>"
"#
}

#[test]
fn workflow_chains_exposed_outputs_between_tasks() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("create_app.yaml"), create_app_doc());
    write(&dir.path().join("check_code.yaml"), check_code_doc());
    write(&dir.path().join("smoke.yaml"), workflow_doc());

    let transport = RecordingTransport::replying(201, json!({"id": "app-77"}));
    let ctx = ExecutionContext::new(dir.path(), &transport);

    let outcome = execute_file(dir.path().join("smoke.yaml"), &ctx).expect("execute");
    let DocumentOutcome::Workflow { report } = &outcome else {
        panic!("expected workflow outcome");
    };

    assert!(report.failure.is_none(), "failure: {:?}", report.failure);
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.id.as_deref(), Some("smoke"));

    // Task 'create' exposed {code: 201, id: "app-77"}.
    let create = &report.outcomes[0];
    assert_eq!(create.exposed[0].label, "code");
    assert_eq!(create.exposed[0].value, json!(201));
    assert_eq!(create.exposed[1].value, json!("app-77"));

    // Task 'check' resolved prev_code from _steps.create.code and passed.
    let check = &report.outcomes[1];
    let check_report = check.report.as_ref().expect("validate report");
    assert!(check_report.is_pass(), "results: {:?}", check_report.results);
    assert_eq!(check.exposed[0].value, json!(201));

    assert_eq!(transport.call_count(), 1);
    assert!(transport.calls.borrow()[0].ends_with("/apps"));
    assert!(outcome.is_pass());
}

#[test]
fn failing_task_aborts_before_later_tasks_run() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("create_app.yaml"), create_app_doc());
    write(&dir.path().join("check_code.yaml"), check_code_doc());
    write(
        &dir.path().join("flow.yaml"),
        r#"
version: default:workflow:0.8.0
tasks:
  - name: first
    uses: fetch
    file: create_app.yaml
    variables:
      app_name: a
  - name: second
    uses: fetch
    file: create_app.yaml
    variables:
      app_name: b
"#,
    );

    let transport = RecordingTransport::failing();
    let ctx = ExecutionContext::new(dir.path(), &transport);

    let outcome = execute_file(dir.path().join("flow.yaml"), &ctx).expect("execute");
    let DocumentOutcome::Workflow { report } = outcome else {
        panic!("expected workflow outcome");
    };

    let failure = report.failure.expect("failure recorded");
    assert_eq!(failure.task, "first");
    assert_eq!(failure.index, 0);
    assert!(failure.message.contains("connection refused"));
    assert!(report.outcomes.is_empty());

    // The second task's fetch was never invoked.
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn inline_task_data_replaces_the_nested_data_block() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("check.yaml"),
        r#"
version: default:validation:0.7.2
data:
  code: 0
asserts:
  - type: Equal
    actual: "<% _data.code %>"
    expected: 418
"#,
    );
    write(&dir.path().join("create_app.yaml"), create_app_doc());
    write(
        &dir.path().join("flow.yaml"),
        r#"
version: default:workflow:0.8.0
tasks:
  - name: create
    uses: fetch
    file: create_app.yaml
    variables:
      app_name: teapot
  - name: check
    uses: validate
    file: check.yaml
    arguments:
      data:
        code: "<% _steps.create.code %>"
"#,
    );

    let transport = RecordingTransport::replying(418, json!({"id": "x"}));
    let ctx = ExecutionContext::new(dir.path(), &transport);

    let outcome = execute_file(dir.path().join("flow.yaml"), &ctx).expect("execute");
    let DocumentOutcome::Workflow { report } = outcome else {
        panic!("expected workflow outcome");
    };

    assert!(report.failure.is_none(), "failure: {:?}", report.failure);
    let check_report = report.outcomes[1].report.as_ref().expect("report");
    assert!(check_report.is_pass(), "results: {:?}", check_report.results);
}

#[test]
fn task_kind_must_match_the_nested_document() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("create_app.yaml"), create_app_doc());
    write(
        &dir.path().join("flow.yaml"),
        r#"
version: default:workflow:0.8.0
tasks:
  - name: misdeclared
    uses: validate
    file: create_app.yaml
"#,
    );

    let transport = RecordingTransport::replying(200, Value::Null);
    let ctx = ExecutionContext::new(dir.path(), &transport);

    let outcome = execute_file(dir.path().join("flow.yaml"), &ctx).expect("execute");
    let DocumentOutcome::Workflow { report } = outcome else {
        panic!("expected workflow outcome");
    };

    let failure = report.failure.expect("failure recorded");
    assert!(failure.message.contains("uses 'validate'"), "message: {}", failure.message);
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn missing_nested_file_identifies_the_task() {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("flow.yaml"),
        r#"
version: default:workflow:0.8.0
tasks:
  - name: ghost
    uses: fetch
    file: nowhere.yaml
"#,
    );

    let transport = RecordingTransport::replying(200, Value::Null);
    let ctx = ExecutionContext::new(dir.path(), &transport);

    let outcome = execute_file(dir.path().join("flow.yaml"), &ctx).expect("execute");
    let DocumentOutcome::Workflow { report } = outcome else {
        panic!("expected workflow outcome");
    };

    let failure = report.failure.expect("failure recorded");
    assert_eq!(failure.task, "ghost");
    assert!(failure.message.contains("nowhere.yaml"));
}
