//! Client error types.

use thiserror::Error;

/// WebSocket transport errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Handshake with the room endpoint failed.
    #[error("connection to {url} failed: {reason}")]
    Connection {
        /// Endpoint we tried
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// Read or write on an established socket failed.
    #[error("stream error: {0}")]
    Stream(String),

    /// Transport task is gone.
    #[error("transport closed")]
    Closed,
}

/// REST collaborator errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Request never got a response (DNS, TCP, TLS, timeout).
    #[error("request to {url} failed: {detail}")]
    Connect {
        /// Request URL
        url: String,
        /// Underlying failure
        detail: String,
    },

    /// Server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request URL
        url: String,
    },

    /// Response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Returns true if repeating the request could plausibly succeed.
    ///
    /// Connection failures and server-side (5xx) statuses are transient;
    /// client errors and malformed bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connect { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}
