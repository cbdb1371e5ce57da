//! Workflow task definitions and run reports.

use crate::assertion::RunReport;
use crate::document::ExposedValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Execution path for a workflow task, decoded once at load time and matched
/// exhaustively thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Fetch,
    Validate,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Fetch => write!(f, "fetch"),
            TaskKind::Validate => write!(f, "validate"),
        }
    }
}

/// One task in a workflow document. Constructed from the `tasks` sequence at
/// load time and executed exactly once, in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTask {
    /// Task name, used as the `_steps.<name>` namespace for its outputs.
    pub name: String,

    /// Which execution path the nested document takes.
    pub uses: TaskKind,

    /// Path to the nested document, relative to the workflow document.
    pub file: String,

    /// Variable overrides passed into the nested document. Values may be
    /// templated against the workflow-level symbol table.
    #[serde(default)]
    pub variables: Map<String, Value>,

    /// Extra arguments; validate tasks may carry an inline `data` payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<TaskArguments>,
}

/// Optional per-task arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskArguments {
    /// Inline data payload for a validate task, replacing the nested
    /// document's own `data` block.
    #[serde(default)]
    pub data: Option<Value>,
}

/// Result of one completed workflow task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub name: String,
    pub kind: TaskKind,
    /// Values the nested document exposed, in declaration order.
    pub exposed: Vec<ExposedValue>,
    /// Assertion report for validate tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
}

/// Identity and message of the task that aborted a workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowFailure {
    pub task: String,
    pub index: usize,
    pub message: String,
}

/// Ordered per-task outcomes for one workflow run.
///
/// A failing task aborts the remaining sequence; the outcomes of tasks that
/// completed before it stay in `outcomes` and the failure identity lands in
/// `failure`. No rollback of completed task effects is performed.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub outcomes: Vec<TaskOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<WorkflowFailure>,
}

impl WorkflowReport {
    /// True when every task completed and no assertion entry failed.
    pub fn is_pass(&self) -> bool {
        self.failure.is_none()
            && self
                .outcomes
                .iter()
                .all(|outcome| outcome.report.as_ref().map(RunReport::is_pass).unwrap_or(true))
    }
}
