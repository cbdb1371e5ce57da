//! Shared type definitions for the specrun runtime.
//!
//! This crate holds the document model (versions, payload shapes, assertion
//! entries, workflow tasks), the report types produced by executions, and
//! the error taxonomy. It is deliberately free of execution logic; the
//! engine crate consumes these types.

pub mod assertion;
pub mod document;
pub mod error;
pub mod request;
pub mod version;
pub mod workflow;

pub use assertion::{AssertKind, AssertionEntry, AssertionResult, RunReport};
pub use document::{DocPayload, ExposeEntry, ExposedValue, SpecDocument};
pub use error::SpecError;
pub use request::{AuthSpec, BodySpec, RequestSpec};
pub use version::{DocKind, DocVersion, SUPPORTED_DOCUMENTS};
pub use workflow::{TaskArguments, TaskKind, TaskOutcome, WorkflowFailure, WorkflowReport, WorkflowTask};
