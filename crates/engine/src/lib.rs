//! # Specrun Engine
//!
//! Execution runtime for declarative, versioned spec documents. The engine
//! resolves variables through a layered symbol table, substitutes
//! `<% ... %>` templates, executes the document's payload (an HTTP fetch, an
//! assertion run, or a workflow of both), and renders the exposed values.
//!
//! ## Architecture
//!
//! - **`symbols`**: the layered variable namespace built per execution
//! - **`template`**: token parsing and type-preserving substitution
//! - **`assertions`**: the closed assertion registry and sequential runner
//! - **`transport`**: the seam to the HTTP collaborator
//! - **`execute`**: per-document orchestration and outcome types
//! - **`workflow`**: the sequential task pipeline with `_steps` chaining
//!
//! Execution is single-threaded and builds fresh state per document; there
//! are no process-wide singletons.

use specrun_types::SpecError;
use specrun_util::load_document;
use std::path::Path;

pub mod assertions;
pub mod execute;
pub mod expose;
pub mod symbols;
pub mod template;
pub mod transport;
pub mod workflow;

pub use execute::{DocumentOutcome, ExecutionContext, execute_document, execute_value};
pub use symbols::SymbolTable;
pub use transport::{FetchTransport, HttpTransport, NoopTransport};

/// Loads a document file and executes it with the given context.
///
/// Relative `file` references inside workflow documents resolve against the
/// loaded file's directory, superseding the context's `base_dir`.
pub fn execute_file(path: impl AsRef<Path>, ctx: &ExecutionContext) -> Result<DocumentOutcome, SpecError> {
    let loaded = load_document(path)?;
    let file_ctx = ExecutionContext {
        base_dir: loaded.base_dir,
        overrides: ctx.overrides.clone(),
        transport: ctx.transport,
    };
    execute_value(&loaded.value, &file_ctx)
}
