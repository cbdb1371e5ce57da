//! Typed representation of a versioned spec document.
//!
//! `SpecDocument::from_value` is a pure parse/validate step: it checks the
//! version against the registry and requires the type-specific payload key
//! before any payload processing begins. No side effects.

use crate::assertion::AssertionEntry;
use crate::error::SpecError;
use crate::version::{DocKind, DocVersion};
use crate::workflow::WorkflowTask;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry in a document's `expose` list.
///
/// Entries are authored either as a bare template expression string or as a
/// single-key mapping that names the exposed value. Named values are what
/// workflow tasks address through `_steps.<task>.<name>`; unnamed values are
/// bound under their position index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposeEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub expr: String,
}

/// A computed exposed value, labeled either by its authored name or its
/// position in the `expose` list.
#[derive(Debug, Clone, Serialize)]
pub struct ExposedValue {
    pub label: String,
    pub value: Value,
}

/// Type-specific document payload, selected by the version registry.
#[derive(Debug, Clone)]
pub enum DocPayload {
    /// Raw request block; substituted before being deserialized into a
    /// [`crate::request::RequestSpec`].
    Fetch { request: Value },
    /// Assertion entries plus the data payload they run against.
    Validate { asserts: Vec<AssertionEntry>, data: Value },
    /// Ordered task sequence.
    Workflow { tasks: Vec<WorkflowTask> },
}

/// A parsed, versioned declarative document.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    pub version: DocVersion,
    /// Optional document identifier (workflow documents).
    pub id: Option<String>,
    /// Declared variables, in authoring order of the source mapping.
    pub variables: Map<String, Value>,
    /// Ordered template expressions selecting the reported values.
    pub expose: Vec<ExposeEntry>,
    pub payload: DocPayload,
}

impl SpecDocument {
    /// Parses an already-deserialized document mapping.
    pub fn from_value(raw: &Value) -> Result<Self, SpecError> {
        let mapping = raw
            .as_object()
            .ok_or_else(|| SpecError::Document("document root must be a mapping".into()))?;

        let version_raw = mapping
            .get("version")
            .and_then(Value::as_str)
            .ok_or_else(|| SpecError::Version("document is missing the required 'version' key".into()))?;
        let version = DocVersion::parse(version_raw)?;

        let id = mapping.get("id").and_then(Value::as_str).map(str::to_string);
        let variables = mapping
            .get("variables")
            .map(|value| {
                value
                    .as_object()
                    .cloned()
                    .ok_or_else(|| SpecError::Document("'variables' must be a mapping".into()))
            })
            .transpose()?
            .unwrap_or_default();
        let expose = parse_expose(mapping.get("expose"))?;

        let payload = match version.kind {
            DocKind::Fetch => DocPayload::Fetch {
                request: required_value(mapping, "request")?,
            },
            DocKind::Validate => DocPayload::Validate {
                asserts: parse_asserts(required_value(mapping, "asserts")?)?,
                data: mapping.get("data").cloned().unwrap_or(Value::Null),
            },
            DocKind::Workflow => DocPayload::Workflow {
                tasks: parse_tasks(required_value(mapping, "tasks")?)?,
            },
        };

        Ok(Self {
            version,
            id,
            variables,
            expose,
            payload,
        })
    }

    /// The handler kind selected by this document's version.
    pub fn kind(&self) -> DocKind {
        self.version.kind
    }
}

fn required_value(mapping: &Map<String, Value>, key: &str) -> Result<Value, SpecError> {
    let value = mapping
        .get(key)
        .ok_or_else(|| SpecError::Document(format!("document is missing the required '{key}' key")))?;
    let empty = match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(list) => list.is_empty(),
        _ => false,
    };
    if empty {
        return Err(SpecError::Document(format!("'{key}' must not be empty")));
    }
    Ok(value.clone())
}

fn parse_expose(raw: Option<&Value>) -> Result<Vec<ExposeEntry>, SpecError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let list = raw
        .as_array()
        .ok_or_else(|| SpecError::Document("'expose' must be a sequence".into()))?;

    let mut entries = Vec::with_capacity(list.len());
    for item in list {
        match item {
            Value::String(expr) => entries.push(ExposeEntry {
                label: None,
                expr: expr.clone(),
            }),
            Value::Object(map) => {
                let mut pairs = map.iter();
                let (Some((label, expr)), None) = (pairs.next(), pairs.next()) else {
                    return Err(SpecError::Document(
                        "expose entries must be strings or single-key mappings".into(),
                    ));
                };
                let expr = expr
                    .as_str()
                    .ok_or_else(|| SpecError::Document(format!("expose entry '{label}' must map to a string expression")))?;
                entries.push(ExposeEntry {
                    label: Some(label.clone()),
                    expr: expr.to_string(),
                });
            }
            _ => {
                return Err(SpecError::Document(
                    "expose entries must be strings or single-key mappings".into(),
                ));
            }
        }
    }
    Ok(entries)
}

fn parse_asserts(raw: Value) -> Result<Vec<AssertionEntry>, SpecError> {
    serde_json::from_value(raw).map_err(|error| SpecError::Document(format!("invalid 'asserts' list: {error}")))
}

fn parse_tasks(raw: Value) -> Result<Vec<WorkflowTask>, SpecError> {
    serde_json::from_value(raw).map_err(|error| SpecError::Document(format!("invalid 'tasks' list: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_a_fetch_document() {
        let raw = json!({
            "version": "default:http:0.7.2",
            "variables": {"host": "https://api.example.com"},
            "request": {"url": "<% host %>/apps", "method": "GET"},
            "expose": ["<% _response.code %>", {"body": "<% _response.data %>"}]
        });

        let doc = SpecDocument::from_value(&raw).expect("load");
        assert_eq!(doc.kind(), DocKind::Fetch);
        assert_eq!(doc.expose.len(), 2);
        assert_eq!(doc.expose[1].label.as_deref(), Some("body"));
        assert!(matches!(doc.payload, DocPayload::Fetch { .. }));
    }

    #[test]
    fn missing_payload_key_names_the_key() {
        let raw = json!({"version": "default:http:0.7.2"});
        let error = SpecDocument::from_value(&raw).expect_err("missing request");
        assert!(error.to_string().contains("'request'"));

        let raw = json!({"version": "default:validation:0.7.2", "data": {}});
        let error = SpecDocument::from_value(&raw).expect_err("missing asserts");
        assert!(error.to_string().contains("'asserts'"));

        let raw = json!({"version": "default:workflow:0.8.0", "tasks": []});
        let error = SpecDocument::from_value(&raw).expect_err("empty tasks");
        assert!(error.to_string().contains("'tasks'"));
    }

    #[test]
    fn missing_version_is_a_version_error() {
        let error = SpecDocument::from_value(&json!({"request": {}})).expect_err("no version");
        assert!(matches!(error, SpecError::Version(_)));
    }

    #[test]
    fn loads_a_workflow_document_from_yaml() {
        let doc = r#"
version: default:workflow:0.8.0
id: smoke
tasks:
  - name: create
    uses: fetch
    file: create.yaml
  - name: check
    uses: validate
    file: check.yaml
    variables:
      code: "<% _steps.create.code %>"
"#;
        let raw: Value = serde_yaml::from_str(doc).expect("yaml");
        let doc = SpecDocument::from_value(&raw).expect("load");
        assert_eq!(doc.id.as_deref(), Some("smoke"));
        let DocPayload::Workflow { tasks } = &doc.payload else {
            panic!("expected workflow payload");
        };
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].name, "check");
    }
}
