//! Workflow orchestration: sequential task execution with data flow between
//! steps.
//!
//! One workflow-level symbol table, seeded empty, threads across all tasks.
//! Each task deep-substitutes its declared variables against that table,
//! executes its nested document with the result as the override layer, and
//! binds the nested document's exposed outputs under `_steps.<name>`. The
//! first task that raises any error aborts the remaining sequence; completed
//! task effects stay in place.

use crate::execute::{DocumentOutcome, ExecutionContext, execute_document};
use crate::expose;
use crate::symbols::SymbolTable;
use crate::template;
use serde_json::{Map, Value};
use specrun_types::{
    DocKind, SpecDocument, SpecError, TaskKind, TaskOutcome, WorkflowFailure, WorkflowReport, WorkflowTask,
};
use specrun_util::load_document;
use tracing::{debug, warn};

/// Executes a workflow document's tasks in declaration order.
pub fn execute_workflow(document: &SpecDocument, tasks: &[WorkflowTask], ctx: &ExecutionContext) -> Result<DocumentOutcome, SpecError> {
    let mut table = SymbolTable::new();
    let mut outcomes = Vec::with_capacity(tasks.len());
    let mut failure = None;

    for (index, task) in tasks.iter().enumerate() {
        debug!(task = %task.name, index, uses = %task.uses, "starting workflow task");

        match run_task(task, &table, ctx) {
            Ok(outcome) => {
                table.bind_namespaced_output("_steps", &task.name, expose::as_map(&outcome.exposed));
                outcomes.push(outcome);
            }
            Err(error) => {
                let wrapped = error.in_task(&task.name, index);
                warn!(task = %task.name, index, error = %wrapped, "workflow aborted");
                failure = Some(WorkflowFailure {
                    task: task.name.clone(),
                    index,
                    message: wrapped.to_string(),
                });
                break;
            }
        }
    }

    Ok(DocumentOutcome::Workflow {
        report: WorkflowReport {
            id: document.id.clone(),
            outcomes,
            failure,
        },
    })
}

fn run_task(task: &WorkflowTask, table: &SymbolTable, ctx: &ExecutionContext) -> Result<TaskOutcome, SpecError> {
    // Task variables may reference any prior task's exposed output.
    let variables = substitute_variables(&task.variables, table);

    let path = ctx.base_dir.join(&task.file);
    let loaded = load_document(&path)?;

    let mut raw = loaded.value;
    if let Some(data) = task.arguments.as_ref().and_then(|arguments| arguments.data.as_ref()) {
        if task.uses != TaskKind::Validate {
            return Err(SpecError::Document("inline 'arguments.data' is only valid for validate tasks".into()));
        }
        if let Some(mapping) = raw.as_object_mut() {
            mapping.insert("data".to_string(), template::deep_substitute(data, table));
        }
    }

    let nested = SpecDocument::from_value(&raw)?;
    check_task_kind(task, nested.kind())?;

    let nested_ctx = ExecutionContext {
        base_dir: loaded.base_dir,
        overrides: variables,
        transport: ctx.transport,
    };

    match execute_document(&nested, &nested_ctx)? {
        DocumentOutcome::Fetch { exposed, .. } => Ok(TaskOutcome {
            name: task.name.clone(),
            kind: task.uses,
            exposed,
            report: None,
        }),
        DocumentOutcome::Validate { report, exposed } => Ok(TaskOutcome {
            name: task.name.clone(),
            kind: task.uses,
            exposed,
            report: Some(report),
        }),
        DocumentOutcome::Workflow { .. } => Err(SpecError::Document(format!(
            "task '{}' points at a workflow document; workflows cannot nest",
            task.name
        ))),
    }
}

fn substitute_variables(variables: &Map<String, Value>, table: &SymbolTable) -> Map<String, Value> {
    variables
        .iter()
        .map(|(key, value)| (key.clone(), template::deep_substitute(value, table)))
        .collect()
}

fn check_task_kind(task: &WorkflowTask, kind: DocKind) -> Result<(), SpecError> {
    let matches = matches!(
        (task.uses, kind),
        (TaskKind::Fetch, DocKind::Fetch) | (TaskKind::Validate, DocKind::Validate)
    );
    if !matches {
        return Err(SpecError::Document(format!(
            "task '{}' uses '{}' but '{}' is a {} document",
            task.name, task.uses, task.file, kind
        )));
    }
    Ok(())
}
