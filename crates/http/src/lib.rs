//! HTTP transport client for fetch documents.
//!
//! This crate owns the boundary between a substituted `request` block and
//! the wire: [`compile_request`] validates the method and URL and normalizes
//! parameters, and [`HttpClient::execute`] sends the compiled request and
//! parses the response. The engine never touches reqwest directly.

use indexmap::IndexMap;
use reqwest::{Client, Method, RequestBuilder, header};
use serde_json::{Value, json};
use specrun_types::{AuthSpec, BodySpec, RequestSpec, SpecError};
use specrun_util::{display_string, redact_sensitive};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Default timeout applied to every outbound request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A validated, ready-to-send request.
#[derive(Debug, Clone)]
pub struct CompiledRequest {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub auth: Option<AuthSpec>,
    pub body: Option<BodySpec>,
}

/// Response of one executed fetch, bound into the symbol table as `_response`.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub code: u16,
    pub headers: IndexMap<String, String>,
    /// Parsed JSON body when the payload is valid JSON, raw text otherwise.
    pub data: Value,
    pub elapsed_ms: u64,
}

impl FetchResponse {
    /// Shape exposed to templates: `{code, headers, data, elapsed_ms}`.
    pub fn to_value(&self) -> Value {
        json!({
            "code": self.code,
            "headers": self.headers,
            "data": self.data,
            "elapsed_ms": self.elapsed_ms,
        })
    }
}

/// Validates and normalizes a substituted request block.
pub fn compile_request(spec: &RequestSpec) -> Result<CompiledRequest, SpecError> {
    let normalized = spec.method.trim().to_ascii_uppercase();
    // reqwest's Method accepts arbitrary extension tokens; documents are
    // limited to the standard verbs.
    let method = match normalized.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" | "OPTIONS" => {
            Method::from_str(&normalized).map_err(|_| SpecError::Document(format!("unsupported HTTP method '{normalized}'")))?
        }
        _ => return Err(SpecError::Document(format!("unsupported HTTP method '{}'", spec.method))),
    };
    let url = Url::parse(&spec.url).map_err(|error| SpecError::Document(format!("invalid request url '{}': {error}", spec.url)))?;

    let query = spec
        .url_params
        .iter()
        .map(|(key, value)| (key.clone(), display_string(value)))
        .collect();
    let headers = spec
        .headers
        .iter()
        .map(|(key, value)| (key.clone(), display_string(value)))
        .collect();

    Ok(CompiledRequest {
        method,
        url,
        query,
        headers,
        auth: spec.auth.clone(),
        body: spec.body.clone(),
    })
}

/// Thin wrapper around a configured `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    user_agent: String,
}

impl HttpClient {
    /// Constructs a client with sensible defaults: JSON accept header and a
    /// 30 second timeout.
    pub fn new() -> Result<Self, SpecError> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json, */*"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| SpecError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            user_agent: format!("specrun/0.1; {}", std::env::consts::OS),
        })
    }

    /// Sends a compiled request and parses the response.
    pub async fn execute(&self, request: &CompiledRequest) -> Result<FetchResponse, SpecError> {
        let builder = self.build(request)?;
        let started = Instant::now();

        let response = builder
            .send()
            .await
            .map_err(|error| SpecError::Transport(redact_sensitive(&error.to_string())))?;
        let code = response.status().as_u16();

        let mut headers = IndexMap::new();
        for (name, value) in response.headers() {
            headers.insert(name.as_str().to_string(), value.to_str().unwrap_or_default().to_string());
        }

        let text = response.text().await.unwrap_or_default();
        let data = parse_response_payload(&text);
        let elapsed_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        debug!(code, elapsed_ms, "fetch completed");

        Ok(FetchResponse {
            code,
            headers,
            data,
            elapsed_ms,
        })
    }

    fn build(&self, request: &CompiledRequest) -> Result<RequestBuilder, SpecError> {
        debug!(method = %request.method, url = %request.url, "building request");

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .header(header::USER_AGENT, &self.user_agent)
            .query(&request.query);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        builder = match &request.auth {
            Some(AuthSpec::Basic { username, password }) => builder.basic_auth(username, Some(password)),
            Some(AuthSpec::Bearer { token }) => builder.bearer_auth(token),
            None => builder,
        };

        builder = match &request.body {
            Some(BodySpec::Json(value)) => builder.json(value),
            Some(BodySpec::Form(fields)) => {
                let pairs: Vec<(String, String)> = fields.iter().map(|(key, value)| (key.clone(), display_string(value))).collect();
                builder.form(&pairs)
            }
            Some(BodySpec::FormData(fields)) => {
                let mut form = reqwest::multipart::Form::new();
                for (key, value) in fields {
                    form = form.text(key.clone(), display_string(value));
                }
                builder.multipart(form)
            }
            Some(BodySpec::Text(text)) => builder.header(header::CONTENT_TYPE, "text/plain").body(text.clone()),
            Some(BodySpec::Xml(text)) => builder.header(header::CONTENT_TYPE, "application/xml").body(text.clone()),
            None => builder,
        };

        Ok(builder)
    }
}

/// Parses a response body as JSON, falling back to the raw text.
fn parse_response_payload(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_spec(raw: Value) -> RequestSpec {
        serde_json::from_value(raw).expect("request spec")
    }

    #[test]
    fn compile_validates_method_and_url() {
        let spec = request_spec(json!({"url": "https://api.example.com/x", "method": "patch"}));
        let compiled = compile_request(&spec).expect("compile");
        assert_eq!(compiled.method, Method::PATCH);

        let spec = request_spec(json!({"url": "not a url"}));
        assert!(compile_request(&spec).is_err());

        let spec = request_spec(json!({"url": "https://x.test", "method": "TELEPORT"}));
        assert!(compile_request(&spec).is_err());
    }

    #[test]
    fn compile_stringifies_params_and_headers() {
        let spec = request_spec(json!({
            "url": "https://x.test",
            "url_params": {"page": 2, "all": true},
            "headers": {"X-Count": 7}
        }));
        let compiled = compile_request(&spec).expect("compile");
        assert_eq!(compiled.query, vec![("page".into(), "2".into()), ("all".into(), "true".into())]);
        assert_eq!(compiled.headers, vec![("X-Count".into(), "7".into())]);
    }

    #[test]
    fn response_payload_parses_json_and_falls_back_to_text() {
        assert_eq!(parse_response_payload(r#"{"id": 1}"#), json!({"id": 1}));
        assert_eq!(parse_response_payload("plain body"), json!("plain body"));
        assert_eq!(parse_response_payload(""), Value::Null);
    }

    #[test]
    fn response_value_shape() {
        let response = FetchResponse {
            code: 201,
            headers: IndexMap::from([("content-type".to_string(), "application/json".to_string())]),
            data: json!({"id": "app-1"}),
            elapsed_ms: 12,
        };
        let value = response.to_value();
        assert_eq!(value["code"], 201);
        assert_eq!(value["data"]["id"], "app-1");
        assert_eq!(value["headers"]["content-type"], "application/json");
    }
}
