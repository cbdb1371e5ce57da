//! Error taxonomy shared across the runtime.
//!
//! Validation-phase errors (`Document`, `Version`, `VariableNaming`,
//! `AssertionType`) abort a document execution before any side-effecting
//! call. `Validation` marks assertion inputs that are structurally
//! inapplicable to the assertion kind; the assertion runner records it as a
//! failed entry and keeps going. `Task` wraps any error with the identity of
//! the workflow task that raised it.

use thiserror::Error;

/// Errors surfaced by document loading, validation, and execution.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Malformed or incomplete document input.
    #[error("invalid document: {0}")]
    Document(String),

    /// Missing or unsupported document version string.
    #[error("invalid version: {0}")]
    Version(String),

    /// A declared variable name violates the naming rules.
    #[error("invalid variable name '{0}': names must start with a letter and contain only letters, digits, and underscores")]
    VariableNaming(String),

    /// Unknown assertion type; aborts the remaining assertions in the run.
    #[error("unknown assertion type '{0}'")]
    AssertionType(String),

    /// Assertion inputs are structurally inapplicable to the assertion kind.
    #[error("{0}")]
    Validation(String),

    /// The fetch transport failed (connection, timeout, protocol).
    #[error("transport error: {0}")]
    Transport(String),

    /// Reading or deserializing a document file failed.
    #[error("failed to load document '{path}': {reason}")]
    Load { path: String, reason: String },

    /// A workflow task failed; wraps the underlying error with the task identity.
    #[error("task '{name}' (#{index}) failed: {source}")]
    Task {
        name: String,
        index: usize,
        #[source]
        source: Box<SpecError>,
    },
}

impl SpecError {
    /// Wraps an error with the identity of the workflow task that raised it.
    pub fn in_task(self, name: impl Into<String>, index: usize) -> Self {
        SpecError::Task {
            name: name.into(),
            index,
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_wrapping_names_the_failing_task() {
        let err = SpecError::Version("missing".into()).in_task("deploy", 2);
        let message = err.to_string();
        assert!(message.contains("'deploy'"));
        assert!(message.contains("#2"));
    }
}
