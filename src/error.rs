//! Client error types.

use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Everything a request can fail with.
///
/// The three shapes callers most often match on are [`Timeout`], [`HttpStatus`]
/// and [`Transport`]; the remaining variants cover failures that happen before
/// the exchange (a malformed URL, an unserializable body) or inside a custom
/// interceptor.
///
/// [`Timeout`]: RequestError::Timeout
/// [`HttpStatus`]: RequestError::HttpStatus
/// [`Transport`]: RequestError::Transport
#[derive(Debug, Error)]
pub enum RequestError {
    /// The configured duration elapsed before the exchange settled.
    #[error("Request timed-out")]
    Timeout,

    /// A response arrived, but its status was outside `[200, 300)`.
    #[error("HTTP status {status} {status_text}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
        /// Response body, decoded best-effort (JSON value or raw text).
        error: Value,
    },

    /// No response could be obtained from the transport at all.
    #[error("Fetch failed")]
    Transport {
        /// The underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The target could not be combined with the base URL into a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    BodyEncode(String),

    /// An interceptor failed.
    #[error("interceptor error: {0}")]
    Interceptor(String),
}

impl RequestError {
    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Get the HTTP status code if this is a status error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
