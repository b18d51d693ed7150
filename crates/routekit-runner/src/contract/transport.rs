//! Execution engine: send one synthesized request, measure it, read the body

use std::time::{Duration, Instant};

use routekit_core::Method;
use serde_json::Value;

use super::request::SyntheticRequest;

/// What came back for a request. Any status code is a valid response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status_code: u16,
    /// Parsed JSON when the body is JSON, else the raw text; `Null` when empty
    pub body: Value,
    pub elapsed: Duration,
}

/// Sends exactly one request per call.
///
/// Received responses are `Ok` whatever their status; only failures to get
/// a response at all are errors.
pub trait Transport {
    /// # Errors
    ///
    /// Returns [`ExecutionError`] on connection failure, timeout, or an
    /// unreadable response body
    fn send(&self, request: &SyntheticRequest, timeout: Duration)
    -> Result<HttpResponse, ExecutionError>;
}

/// [`Transport`] over a blocking `reqwest` client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed (e.g. TLS backend failure)
    pub fn new() -> Result<Self, ExecutionError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| ExecutionError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    #[must_use]
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: &SyntheticRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, ExecutionError> {
        let mut req = self
            .client
            .request(to_reqwest(request.method), &request.url)
            .timeout(timeout);
        for (key, value) in &request.headers {
            req = req.header(key, value);
        }
        if let Some(body) = &request.body {
            let bytes =
                serde_json::to_vec(body).map_err(|e| ExecutionError::Build(e.to_string()))?;
            req = req.body(bytes);
        }
        let req = req.build().map_err(|e| ExecutionError::Build(e.to_string()))?;

        let start = Instant::now();
        let resp = self.client.execute(req).map_err(|e| classify(&e, timeout))?;
        let status_code = resp.status().as_u16();
        let text = resp.text().map_err(|e| match classify(&e, timeout) {
            timed_out @ ExecutionError::Timeout(_) => timed_out,
            _ => ExecutionError::Decode(e.to_string()),
        })?;
        let elapsed = start.elapsed();

        Ok(HttpResponse {
            status_code,
            body: parse_body(&text),
            elapsed,
        })
    }
}

fn classify(e: &reqwest::Error, timeout: Duration) -> ExecutionError {
    if e.is_timeout() {
        ExecutionError::Timeout(timeout.as_millis())
    } else if e.is_builder() {
        ExecutionError::Build(e.to_string())
    } else {
        ExecutionError::Transport(e.to_string())
    }
}

/// JSON when it parses, otherwise the text itself.
#[must_use]
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Invalid request: {0}")]
    Build(String),
    #[error("Request timed out after {0}ms")]
    Timeout(u128),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Unreadable response body: {0}")]
    Decode(String),
}
