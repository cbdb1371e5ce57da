//! Document version parsing and the closed registry of supported documents.
//!
//! Every spec document carries a `version` string of the form
//! `<provider>:<doc_type>:<doc_type_version>`. The document type may itself
//! contain colons, so parsing takes the first segment as the provider, the
//! last as the version, and joins everything in between back into the type.

use crate::error::SpecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported `(doc_type, doc_type_version)` pairs. A document whose version
/// resolves outside this table is rejected before any payload processing.
pub const SUPPORTED_DOCUMENTS: &[(&str, &str, DocKind)] = &[
    ("http", "0.7.2", DocKind::Fetch),
    ("validation", "0.7.2", DocKind::Validate),
    ("workflow", "0.8.0", DocKind::Workflow),
];

/// The kind of payload a document carries, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    /// An outbound HTTP request description.
    Fetch,
    /// An assertion set evaluated against a data payload.
    Validate,
    /// An ordered sequence of fetch/validate tasks.
    Workflow,
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocKind::Fetch => write!(f, "fetch"),
            DocKind::Validate => write!(f, "validate"),
            DocKind::Workflow => write!(f, "workflow"),
        }
    }
}

/// Parsed and registry-checked document version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocVersion {
    pub provider: String,
    pub doc_type: String,
    pub doc_type_version: String,
    /// Handler selected from the registry for this type+version pair.
    pub kind: DocKind,
}

impl DocVersion {
    /// Parses a raw version string and validates it against the registry.
    pub fn parse(raw: &str) -> Result<Self, SpecError> {
        let segments: Vec<&str> = raw.split(':').collect();
        if segments.len() < 3 {
            return Err(SpecError::Version(format!(
                "expected '<provider>:<doc_type>:<version>', got '{raw}'"
            )));
        }
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(SpecError::Version(format!("empty segment in '{raw}'")));
        }

        let provider = segments[0].trim().to_string();
        let doc_type_version = segments[segments.len() - 1].trim().to_string();
        let doc_type = segments[1..segments.len() - 1].join(":").trim().to_string();

        let kind = SUPPORTED_DOCUMENTS
            .iter()
            .find(|(supported_type, supported_version, _)| {
                *supported_type == doc_type && *supported_version == doc_type_version
            })
            .map(|(_, _, kind)| *kind)
            .ok_or_else(|| {
                SpecError::Version(format!(
                    "unsupported document '{doc_type}:{doc_type_version}'"
                ))
            })?;

        Ok(Self {
            provider,
            doc_type,
            doc_type_version,
            kind,
        })
    }
}

impl FromStr for DocVersion {
    type Err = SpecError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for DocVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.provider, self.doc_type, self.doc_type_version)
    }
}
