//! Transport layer for RPC communication

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::SdkError;

/// A single outbound HTTP exchange, already encoded by the gateway
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Endpoint URL
    pub url: String,
    /// Serialized JSON-RPC call envelope
    pub body: Vec<u8>,
    /// Value of the `Authorization` header, if a credential is attached
    pub auth_token: Option<String>,
    /// Bound on the whole exchange
    pub timeout: Option<Duration>,
}

/// Raw HTTP response handed back to the gateway
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST the request body and return the raw response
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SdkError>;
}

/// Mock transport for testing
///
/// Responses are full JSON-RPC envelopes keyed by remote method name.
/// Every request is recorded so tests can assert on what was (or was not)
/// sent.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, (u16, Value)>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    calls: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method` with a successful envelope wrapping `result`
    pub fn set_result(&self, method: &str, result: Value) {
        self.set_envelope(method, json!({ "version": "1.1", "result": [result] }));
    }

    /// Answer `method` with an arbitrary response body and HTTP 200
    pub fn set_envelope(&self, method: &str, envelope: Value) {
        self.set_response(method, 200, envelope);
    }

    /// Answer `method` with a JSON-RPC error object (HTTP 500, as the service does)
    pub fn set_error(&self, method: &str, code: i64, message: &str) {
        self.set_response(
            method,
            500,
            json!({
                "version": "1.1",
                "error": {
                    "name": "JSONRPCError",
                    "code": code,
                    "message": message,
                    "error": null,
                }
            }),
        );
    }

    /// Answer `method` with the given status and body
    pub fn set_response(&self, method: &str, status: u16, body: Value) {
        self.responses
            .lock()
            .insert(method.to_string(), (status, body));
    }

    /// Clear custom responses
    pub fn clear_responses(&self) {
        self.responses.lock().clear();
    }

    /// Number of requests that reached this transport
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Decoded body of the most recent request
    pub fn last_request_body(&self) -> Option<Value> {
        self.requests
            .lock()
            .last()
            .and_then(|r| serde_json::from_slice(&r.body).ok())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SdkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let method = serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|v| v.get("method").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();
        self.requests.lock().push(request);

        let canned = self.responses.lock().get(&method).cloned();
        let (status, body) = canned.unwrap_or_else(|| {
            (
                500,
                json!({
                    "version": "1.1",
                    "error": {
                        "name": "JSONRPCError",
                        "code": -32601,
                        "message": format!("Method not found: {}", method),
                    }
                }),
            )
        });

        Ok(HttpResponse {
            status,
            body: Bytes::from(serde_json::to_vec(&body)?),
        })
    }
}

/// HTTP transport for real RPC communication
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Wrap a preconfigured reqwest client (proxies, TLS roots, ...)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SdkError> {
        let timeout = request.timeout;
        let mut builder = self
            .client
            .post(&request.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(request.body);

        if let Some(token) = request.auth_token {
            builder = builder.header(reqwest::header::AUTHORIZATION, token);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let map_err = |e: reqwest::Error| match timeout {
            Some(t) if e.is_timeout() => SdkError::Timeout(t),
            _ => SdkError::Io(e.to_string()),
        };

        let response = builder.send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_err)?;

        Ok(HttpResponse { status, body })
    }
}
