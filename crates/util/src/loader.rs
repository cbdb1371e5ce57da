//! Document file loading with automatic YAML/JSON detection.
//!
//! The loader produces an untyped `serde_json::Value` mapping plus the
//! resolved base directory; relative `file` references inside workflow
//! documents are resolved against that directory.

use serde_json::Value;
use specrun_types::SpecError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A deserialized document plus the directory it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Untyped document mapping, ready for `SpecDocument::from_value`.
    pub value: Value,
    /// Directory containing the document file.
    pub base_dir: PathBuf,
}

/// Loads a document file from the filesystem.
///
/// JSON is valid YAML, so a single `serde_yaml` pass handles both formats.
pub fn load_document(path: impl AsRef<Path>) -> Result<LoadedDocument, SpecError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading document");

    let content = fs::read_to_string(path).map_err(|error| SpecError::Load {
        path: path.display().to_string(),
        reason: error.to_string(),
    })?;

    let value: Value = serde_yaml::from_str(&content).map_err(|error| SpecError::Load {
        path: path.display().to_string(),
        reason: error.to_string(),
    })?;

    let base_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(LoadedDocument { value, base_dir })
}
