//! Transport seam for fetch documents.
//!
//! The engine never performs network I/O itself; it hands a compiled request
//! to a [`FetchTransport`]. The default [`HttpTransport`] sends it over the
//! wire, while [`NoopTransport`] echoes the request back for previews and
//! tests.

use serde_json::json;
use specrun_http::{CompiledRequest, FetchResponse, HttpClient};
use specrun_types::SpecError;
use specrun_util::block_on_future;
use tracing::debug;

/// Sends one prepared request and produces a response.
///
/// Implementations are invoked at most once per fetch document execution.
pub trait FetchTransport {
    fn send(&self, request: &CompiledRequest) -> Result<FetchResponse, SpecError>;
}

/// Echoes the compiled request back as a synthetic 200 response. Useful for
/// dry runs and for tests that must not touch the network.
pub struct NoopTransport;

impl FetchTransport for NoopTransport {
    fn send(&self, request: &CompiledRequest) -> Result<FetchResponse, SpecError> {
        let data = json!({
            "method": request.method.as_str(),
            "url": request.url.as_str(),
            "query": request
                .query
                .iter()
                .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
                .collect::<serde_json::Map<_, _>>(),
        });
        Ok(FetchResponse {
            code: 200,
            headers: Default::default(),
            data,
            elapsed_ms: 0,
        })
    }
}

/// Real transport backed by the shared HTTP client. Bridges the async
/// reqwest call back into the synchronous execution core.
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    pub fn new() -> Result<Self, SpecError> {
        Ok(Self {
            client: HttpClient::new()?,
        })
    }
}

impl FetchTransport for HttpTransport {
    fn send(&self, request: &CompiledRequest) -> Result<FetchResponse, SpecError> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let client = self.client.clone();
        let request = request.clone();

        block_on_future(async move { client.execute(&request).await.map_err(anyhow::Error::from) }).map_err(|error| {
            error
                .downcast::<SpecError>()
                .unwrap_or_else(|other| SpecError::Transport(other.to_string()))
        })
    }
}
