//! SDK error types

use std::time::Duration;

use thiserror::Error;

/// SDK error type
#[derive(Debug, Error)]
pub enum SdkError {
    /// Credential exchange or use was rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Transport/network error
    #[error("I/O error: {0}")]
    Io(String),

    /// The configured read timeout elapsed before a response arrived
    #[error("I/O error: timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// Response was unparsable or violated the result envelope contract
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON-RPC error returned by the server
    #[error("Remote error: {code} - {message}")]
    Remote {
        /// Error code
        code: i64,
        /// Error name reported by the server (e.g. "JSONRPCError")
        name: Option<String>,
        /// Error message
        message: String,
        /// Server-side detail, usually a stack trace
        data: Option<String>,
    },

    /// A credential would have been sent over plaintext HTTP
    #[error("Security error: {0}")]
    Security(String),

    /// Endpoint URL is not http or https
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Call arguments could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SdkError {
    /// True for network-level failures, including timeouts
    pub fn is_io(&self) -> bool {
        matches!(self, SdkError::Io(_) | SdkError::Timeout(_))
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for SdkError {
    fn from(e: std::io::Error) -> Self {
        SdkError::Io(e.to_string())
    }
}
