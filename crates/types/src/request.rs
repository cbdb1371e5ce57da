//! Request payload shapes for fetch documents.
//!
//! The request block is kept as raw JSON until template substitution has
//! run, then deserialized into these types right before compilation into an
//! outbound HTTP call.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative description of an outbound HTTP request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Absolute request URL.
    pub url: String,

    /// HTTP method name, validated at compile time.
    #[serde(default = "default_method")]
    pub method: String,

    /// Query string parameters appended to the URL.
    #[serde(default)]
    pub url_params: IndexMap<String, Value>,

    /// Additional request headers.
    #[serde(default)]
    pub headers: IndexMap<String, Value>,

    /// Optional authentication scheme.
    #[serde(default)]
    pub auth: Option<AuthSpec>,

    /// Optional request body.
    #[serde(default)]
    pub body: Option<BodySpec>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Authentication scheme for a request, externally tagged in the document
/// (`auth: { basic: {...} }` or `auth: { bearer: {...} }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthSpec {
    /// HTTP basic authentication.
    Basic { username: String, password: String },
    /// Bearer token authentication.
    Bearer { token: String },
}

/// Request body variants, externally tagged in the document
/// (`body: { json: {...} }`, `body: { form: {...} }`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BodySpec {
    /// JSON body, sent with `application/json`.
    #[serde(rename = "json")]
    Json(Value),
    /// URL-encoded form body.
    #[serde(rename = "form")]
    Form(IndexMap<String, Value>),
    /// Multipart form body.
    #[serde(rename = "form-data")]
    FormData(IndexMap<String, Value>),
    /// Raw text body, sent with `text/plain`.
    #[serde(rename = "text")]
    Text(String),
    /// Raw XML body, sent with `application/xml`.
    #[serde(rename = "xml")]
    Xml(String),
}
