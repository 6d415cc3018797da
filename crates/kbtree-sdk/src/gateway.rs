//! RPC call gateway
//!
//! Every remote method funnels through [`RpcGateway::call`]: it encodes a
//! JSON-RPC 1.1 envelope, enforces the plaintext-credential rule, sends the
//! request over a [`Transport`] and unwraps the one-element result envelope
//! the service always replies with.

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::{AuthToken, IdentityProvider};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::SdkError;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// JSON-RPC protocol version the service speaks
pub const RPC_VERSION: &str = "1.1";

/// Outbound call envelope
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    /// Positional arguments
    pub params: &'a [Value],
    /// Fully qualified remote method, e.g. `Tree.get_tree`
    pub method: &'a str,
    /// Protocol version
    pub version: &'static str,
    /// Call id
    pub id: String,
}

/// Inbound response envelope
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    /// Result list on success
    #[serde(default)]
    pub result: Option<Value>,
    /// Error object on failure
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// JSON-RPC error object as the service reports it
#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    /// Error name
    #[serde(default)]
    pub name: Option<String>,
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
    /// Server-side detail (stack trace)
    #[serde(default)]
    pub error: Option<Value>,
}

impl From<RpcErrorObject> for SdkError {
    fn from(e: RpcErrorObject) -> Self {
        let data = e.error.and_then(|d| match d {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        SdkError::Remote {
            code: e.code,
            name: e.name,
            message: e.message,
            data,
        }
    }
}

/// Per-gateway call configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSettings {
    /// Bound on each call, `None` waits forever
    pub read_timeout: Option<Duration>,
    /// Allow sending a credential over plaintext http
    pub auth_allowed_for_http: bool,
}

/// Gateway to the remote service
///
/// Calls take `&self` and hold no call-scoped state, so one gateway can be
/// shared between tasks. Configuration changes apply to calls that start
/// after the setter returns.
pub struct RpcGateway {
    url: String,
    token: Option<AuthToken>,
    transport: Box<dyn Transport>,
    settings: RwLock<CallSettings>,
    next_response_file: Mutex<Option<PathBuf>>,
}

impl RpcGateway {
    /// Gateway without credentials over HTTP transport
    #[cfg(feature = "http")]
    pub fn new(url: &str) -> Result<Self, SdkError> {
        Self::with_transport(url, None, HttpTransport::new())
    }

    /// Gateway with a pre-obtained token over HTTP transport
    #[cfg(feature = "http")]
    pub fn with_token(url: &str, token: AuthToken) -> Result<Self, SdkError> {
        Self::with_transport(url, Some(token), HttpTransport::new())
    }

    /// Exchange `user`/`password` with `provider`, then build an HTTP gateway
    #[cfg(feature = "http")]
    pub async fn with_credentials(
        url: &str,
        user: &str,
        password: &str,
        provider: &dyn IdentityProvider,
    ) -> Result<Self, SdkError> {
        Self::with_credentials_and_transport(url, user, password, provider, HttpTransport::new())
            .await
    }

    /// Exchange `user`/`password` with `provider`, then build a gateway on `transport`
    pub async fn with_credentials_and_transport(
        url: &str,
        user: &str,
        password: &str,
        provider: &dyn IdentityProvider,
        transport: impl Transport + 'static,
    ) -> Result<Self, SdkError> {
        validate_url(url)?;
        let token = provider.authenticate(user, password).await?;
        Self::with_transport(url, Some(token), transport)
    }

    /// Gateway on a custom transport
    pub fn with_transport(
        url: &str,
        token: Option<AuthToken>,
        transport: impl Transport + 'static,
    ) -> Result<Self, SdkError> {
        validate_url(url)?;
        Ok(Self::from_parts(url, token, transport))
    }

    pub(crate) fn from_parts(
        url: &str,
        token: Option<AuthToken>,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            url: url.to_string(),
            token,
            transport: Box::new(transport),
            settings: RwLock::new(CallSettings::default()),
            next_response_file: Mutex::new(None),
        }
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Attached credential, if any
    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    /// Current configuration snapshot
    pub fn settings(&self) -> CallSettings {
        *self.settings.read()
    }

    /// Set the read timeout in milliseconds; `None` disables it
    pub fn set_read_timeout(&self, milliseconds: Option<u64>) {
        self.settings.write().read_timeout = milliseconds.map(Duration::from_millis);
    }

    /// Current read timeout
    pub fn read_timeout(&self) -> Option<Duration> {
        self.settings.read().read_timeout
    }

    /// Whether a credential may be sent over plaintext http
    pub fn is_auth_allowed_for_http(&self) -> bool {
        self.settings.read().auth_allowed_for_http
    }

    /// Allow or forbid sending a credential over plaintext http
    pub fn set_auth_allowed_for_http(&self, allowed: bool) {
        self.settings.write().auth_allowed_for_http = allowed;
    }

    /// Read the next call's raw response from `path` instead of the network
    ///
    /// Test hook: consumed by the next call that passes the plaintext
    /// credential check.
    pub fn set_file_for_next_rpc_response(&self, path: impl Into<PathBuf>) {
        *self.next_response_file.lock() = Some(path.into());
    }

    /// Call `method` with positional `args` and decode the single result value
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T, SdkError> {
        let settings = self.settings();
        let id = new_call_id();
        tracing::debug!(method, %id, "rpc call");

        self.check_transport_security(&settings)?;

        let fixture = self.next_response_file.lock().take();
        let response = match fixture {
            Some(path) => {
                tracing::debug!(method, path = %path.display(), "reading response from fixture file");
                let body = tokio::fs::read(&path).await?;
                HttpResponse {
                    status: 200,
                    body: Bytes::from(body),
                }
            }
            None => {
                let envelope = RpcRequest {
                    params: &args,
                    method,
                    version: RPC_VERSION,
                    id,
                };
                let request = HttpRequest {
                    url: self.url.clone(),
                    body: serde_json::to_vec(&envelope)?,
                    auth_token: self.token.as_ref().map(|t| t.as_str().to_string()),
                    timeout: settings.read_timeout,
                };
                self.transport.send(request).await.map_err(|e| {
                    tracing::warn!(method, error = %e, "rpc transport failure");
                    e
                })?
            }
        };

        decode_response(method, response).map_err(|e| {
            tracing::warn!(method, error = %e, "rpc call failed");
            e
        })
    }

    fn check_transport_security(&self, settings: &CallSettings) -> Result<(), SdkError> {
        if self.token.is_some() && is_plaintext(&self.url) && !settings.auth_allowed_for_http {
            return Err(SdkError::Security(
                "refusing to send credentials over unencrypted http; use https or allow auth over http"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Unwrap a raw response into the single decoded result value
fn decode_response<T: DeserializeOwned>(method: &str, response: HttpResponse) -> Result<T, SdkError> {
    let parsed = match serde_json::from_slice::<RpcResponse>(&response.body) {
        Ok(RpcResponse { error: Some(error), .. }) => return Err(error.into()),
        Err(e) if has_error_member(&response.body) => {
            return Err(SdkError::Protocol(format!(
                "malformed error object in response to {}: {}",
                method, e
            )))
        }
        other => other,
    };
    if !response.is_success() {
        return Err(SdkError::Io(format!(
            "{} returned HTTP {}",
            method, response.status
        )));
    }

    let parsed = parsed
        .map_err(|e| SdkError::Protocol(format!("unparsable response to {}: {}", method, e)))?;
    let result = parsed
        .result
        .ok_or_else(|| SdkError::Protocol(format!("response to {} has no result", method)))?;

    let value = unwrap_single(result)
        .map_err(|msg| SdkError::Protocol(format!("response to {}: {}", method, msg)))?;
    serde_json::from_value(value).map_err(|e| {
        SdkError::Protocol(format!("unexpected result shape from {}: {}", method, e))
    })
}

/// Body is a JSON object with a non-null `error` member
fn has_error_member(body: &[u8]) -> bool {
    serde_json::from_slice::<Value>(body)
        .map(|v| v.get("error").map_or(false, |e| !e.is_null()))
        .unwrap_or(false)
}

/// Enforce the exactly-one-element result envelope
fn unwrap_single(result: Value) -> Result<Value, String> {
    match result {
        Value::Array(mut items) if items.len() == 1 => Ok(items.remove(0)),
        Value::Array(items) => Err(format!(
            "expected exactly 1 result element, got {}",
            items.len()
        )),
        other => Err(format!("expected a result list, got {}", json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn validate_url(url: &str) -> Result<(), SdkError> {
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .ok_or_else(|| SdkError::InvalidUrl(format!("{} (expected http or https)", url)))?;
    if rest.is_empty() {
        return Err(SdkError::InvalidUrl(format!("{} (missing host)", url)));
    }
    Ok(())
}

fn is_plaintext(url: &str) -> bool {
    url.get(..7)
        .map(|scheme| scheme.eq_ignore_ascii_case("http://"))
        .unwrap_or(false)
}

fn new_call_id() -> String {
    rand::thread_rng().gen_range(0..u64::MAX).to_string()
}
