//! Errors at the binary boundary.

use std::io;

use duet_client::{ServiceError, TransportError};
use thiserror::Error;

/// Terminal client errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error on stdin or stdout.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// REST collaborator failed.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// WebSocket transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Flag values that cannot form a valid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
