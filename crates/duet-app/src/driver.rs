//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the room view runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, time::Duration};

use duet_client::ClientEvent;
use duet_core::SyncState;
use duet_proto::AutocompleteRequest;

/// Input delivered to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverInput {
    /// Event for the room view client.
    Client(ClientEvent),
    /// User asked to leave the room view.
    Quit,
}

/// Abstracts I/O operations for the room view runtime.
///
/// Transport and suggestion work is fire-and-forget from the runtime's point
/// of view: the driver starts it and later reports the outcome through
/// [`Driver::next_input`] as a [`ClientEvent`].
///
/// # Implementations
///
/// - **Terminal**: stdin lines, WebSocket transport, HTTP autocomplete
/// - **Simulation**: scripted input, in-memory room server, virtual time
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input.
    ///
    /// Returns `None` if `timeout` elapsed first. `timeout` of `None` means
    /// no timer is armed and the driver may wait indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the input source failed irrecoverably.
    fn next_input(
        &mut self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Option<DriverInput>, Self::Error>> + Send;

    /// Start a transport for `attempt` to `url`.
    ///
    /// Failures are reported as `TransportError` and `TransportClosed` events.
    fn connect(&mut self, attempt: u64, url: &str);

    /// Send a text frame on the transport of `attempt`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport is gone or cannot accept the frame.
    fn transmit(&mut self, attempt: u64, payload: String) -> Result<(), Self::Error>;

    /// Tear down the transport of `attempt`, if present.
    fn disconnect(&mut self, attempt: u64);

    /// Start a suggestion request. The outcome is reported as
    /// `SuggestionCompleted { request_id, .. }`.
    fn request_suggestion(&mut self, request_id: u64, request: AutocompleteRequest);

    /// Render the room view.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, state: &SyncState) -> Result<(), Self::Error>;

    /// Release every resource the driver still holds.
    fn stop(&mut self);
}
