//! Room connection state machine.
//!
//! Owns at most one transport attempt per room view and recovers from drops
//! with a fixed-delay, unlimited retry. Uses the action pattern: methods take
//! time as input and return [`ConnectionAction`]s for the driver to execute.
//!
//! # State Machine
//!
//! ```text
//!            open()                established
//! ┌──────┐ ─────────> ┌─────────┐ ────────────> ┌──────┐
//! │ Idle │            │ Opening │               │ Open │
//! └──────┘ <───────── └─────────┘               └──────┘
//!    ^  │    closed                                │
//!    │  │ schedule reconnect                       │ closed
//!    │  └──────────────> (timer) ─── open() ───>   │
//!    └─────────────────────────────────────────────┘
//! ```
//!
//! Every attempt gets a fresh number. Transport events carry the attempt they
//! belong to, and events for any attempt other than the current one are
//! ignored, so a slow close from a superseded socket can never flip the status
//! of its replacement.

use std::time::Duration;

use duet_proto::{InboundMessage, OutboundMessage};

use crate::{
    env::Moment,
    error::SendError,
    state::{ConnectionStatus, SyncState},
    timer::Timer,
};

/// Delay between a transport close and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Actions returned by the connection state machine.
///
/// The driver executes these:
/// - `Connect`: open a transport to `url`, reporting events tagged `attempt`
/// - `Transmit`: write `payload` on the transport of `attempt`
/// - `Disconnect`: tear down the transport of `attempt`, if still present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a new transport.
    Connect {
        /// Attempt number the transport must tag its events with
        attempt: u64,
        /// Full room endpoint
        url: String,
    },

    /// Send a text frame.
    Transmit {
        /// Attempt whose transport carries the frame
        attempt: u64,
        /// Encoded envelope
        payload: String,
    },

    /// Release the transport.
    Disconnect {
        /// Attempt to tear down
        attempt: u64,
    },
}

/// Lifecycle phase of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No transport. A reconnect may be scheduled.
    Idle,
    /// Transport requested, not yet established.
    Opening,
    /// Transport established.
    Open,
}

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Delay before reconnecting after a close
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { reconnect_delay: DEFAULT_RECONNECT_DELAY }
    }
}

/// Connection manager for one room view.
///
/// Pure state machine: no I/O, no clock. It is the only writer of
/// [`SyncState::connection_status`].
#[derive(Debug, Clone)]
pub struct ConnectionManager<I> {
    url: String,
    config: ConnectionConfig,
    phase: ConnectionPhase,
    attempt: u64,
    reconnect: Timer<I>,
}

impl<I: Moment> ConnectionManager<I> {
    /// Create an idle manager for the room endpoint `url`.
    pub fn new(url: impl Into<String>, config: ConnectionConfig) -> Self {
        Self {
            url: url.into(),
            config,
            phase: ConnectionPhase::Idle,
            attempt: 0,
            reconnect: Timer::new(),
        }
    }

    /// Room endpoint.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Number of the most recent attempt. Zero before the first `open`.
    #[must_use]
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Whether a reconnect is scheduled.
    #[must_use]
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect.is_pending()
    }

    /// Earliest time [`Self::tick`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<I> {
        self.reconnect.deadline()
    }

    /// Start a connection attempt.
    ///
    /// No-op while an attempt is opening or open. Otherwise any scheduled
    /// reconnect is cancelled and superseded by this attempt.
    pub fn open(&mut self) -> Vec<ConnectionAction> {
        if self.phase != ConnectionPhase::Idle {
            tracing::debug!(attempt = self.attempt, phase = ?self.phase, "open ignored");
            return Vec::new();
        }

        self.reconnect.cancel();
        self.attempt += 1;
        self.phase = ConnectionPhase::Opening;
        tracing::info!(attempt = self.attempt, url = %self.url, "opening room connection");

        vec![ConnectionAction::Connect { attempt: self.attempt, url: self.url.clone() }]
    }

    /// Transport for `attempt` is established.
    ///
    /// Returns `true` if this changed the connection status.
    pub fn handle_established(&mut self, state: &mut SyncState, attempt: u64) -> bool {
        if !self.is_current(attempt) || self.phase != ConnectionPhase::Opening {
            tracing::debug!(attempt, current = self.attempt, "ignoring stale establish");
            return false;
        }

        self.phase = ConnectionPhase::Open;
        state.set_connection_status(ConnectionStatus::Connected);
        tracing::info!(attempt, "room connection established");
        true
    }

    /// Text frame received on `attempt`.
    ///
    /// Returns the parsed envelope, or `None` if the frame is stale or
    /// malformed. Malformed frames are logged and dropped.
    pub fn handle_payload(&self, attempt: u64, payload: &str) -> Option<InboundMessage> {
        if !self.is_current(attempt) || self.phase == ConnectionPhase::Idle {
            tracing::debug!(attempt, current = self.attempt, "dropping frame from stale attempt");
            return None;
        }

        match InboundMessage::decode(payload) {
            Ok(message) => Some(message),
            Err(error) => {
                tracing::warn!(attempt, %error, len = payload.len(), "dropping malformed frame");
                None
            },
        }
    }

    /// Transport for `attempt` reported an error.
    ///
    /// Logged only; the close that follows drives the state change.
    pub fn handle_error(&self, attempt: u64, reason: &str) {
        if self.is_current(attempt) && self.phase != ConnectionPhase::Idle {
            tracing::warn!(attempt, reason, "room transport error");
        } else {
            tracing::debug!(attempt, reason, "transport error from stale attempt");
        }
    }

    /// Transport for `attempt` closed, for any reason.
    ///
    /// Marks the view disconnected and schedules exactly one reconnect. A
    /// close for anything but the live attempt is ignored.
    pub fn handle_closed(
        &mut self,
        state: &mut SyncState,
        attempt: u64,
        now: I,
    ) -> Vec<ConnectionAction> {
        if !self.is_current(attempt) || self.phase == ConnectionPhase::Idle {
            tracing::debug!(attempt, current = self.attempt, "ignoring stale close");
            return Vec::new();
        }

        self.phase = ConnectionPhase::Idle;
        state.set_connection_status(ConnectionStatus::Disconnected);
        self.reconnect.schedule(now, self.config.reconnect_delay);
        tracing::info!(
            attempt,
            delay_ms = self.config.reconnect_delay.as_millis() as u64,
            "room connection closed, reconnect scheduled"
        );

        vec![ConnectionAction::Disconnect { attempt }]
    }

    /// Fire the reconnect timer if due.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        if !self.reconnect.fire_if_due(now) {
            return Vec::new();
        }

        tracing::info!(previous_attempt = self.attempt, "reconnecting");
        self.open()
    }

    /// Stop for good: cancel any scheduled reconnect and release the
    /// transport. `open` may be called again afterwards.
    pub fn close(&mut self, state: &mut SyncState) -> Vec<ConnectionAction> {
        let cancelled = self.reconnect.cancel();
        let live = self.phase != ConnectionPhase::Idle;

        self.phase = ConnectionPhase::Idle;
        state.set_connection_status(ConnectionStatus::Disconnected);
        tracing::info!(attempt = self.attempt, live, cancelled, "room connection closed by owner");

        if live { vec![ConnectionAction::Disconnect { attempt: self.attempt }] } else { Vec::new() }
    }

    /// Encode `message` for the live transport.
    ///
    /// # Errors
    ///
    /// - `SendError::NotConnected` if no transport is established. The message
    ///   is dropped, never queued.
    /// - `SendError::Encode` if serialization fails
    pub fn send(&self, message: &OutboundMessage) -> Result<Vec<ConnectionAction>, SendError> {
        if self.phase != ConnectionPhase::Open {
            return Err(SendError::NotConnected);
        }

        let payload = message.encode()?;
        Ok(vec![ConnectionAction::Transmit { attempt: self.attempt, payload }])
    }

    fn is_current(&self, attempt: u64) -> bool {
        attempt == self.attempt
    }
}
