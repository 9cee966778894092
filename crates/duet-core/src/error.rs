//! Error types for the synchronization core.
//!
//! The core has very few failure paths: inbound problems are logged and
//! dropped inside the state machines. The only error a caller sees is a send
//! that could not be transmitted.

use duet_proto::ProtocolError;
use thiserror::Error;

/// Errors returned when transmitting an outbound envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// No live connection. Sends are never queued.
    #[error("not connected")]
    NotConnected,

    /// Envelope could not be serialized
    #[error(transparent)]
    Encode(#[from] ProtocolError),
}

impl SendError {
    /// Returns true if the send may succeed once the connection recovers.
    ///
    /// The core never retries on its own; the next local edit carries the
    /// whole buffer anyway.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotConnected)
    }
}
