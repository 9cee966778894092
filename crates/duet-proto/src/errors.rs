//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding protocol values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload is not a valid envelope (bad JSON, missing fields, wrong types).
    #[error("failed to decode envelope: {0}")]
    Decode(String),

    /// Value could not be serialized.
    #[error("failed to encode envelope: {0}")]
    Encode(String),

    /// Room identifier cannot be used as a path segment.
    #[error("invalid room id {0:?}: must be non-empty and contain no '/' or whitespace")]
    InvalidRoomId(String),

    /// Language name outside the supported set.
    #[error("unsupported language {0:?} (expected python, javascript or typescript)")]
    UnknownLanguage(String),
}
