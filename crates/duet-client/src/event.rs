//! Client events and actions.

use duet_core::ConnectionAction;
use duet_proto::{AutocompleteRequest, AutocompleteResponse, Language};

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Reporting transport activity, tagged with the attempt it belongs to
/// - Forwarding user intents (edits, cursor moves, language changes)
/// - Reporting suggestion service outcomes
/// - Driving time forward via ticks
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Room view opened (or re-opened after `Close`).
    Open,

    /// Room view closing. Releases the transport and all timers.
    Close,

    /// Transport for `attempt` is established.
    TransportEstablished {
        /// Attempt the transport was opened for
        attempt: u64,
    },

    /// Text frame received.
    FrameReceived {
        /// Attempt whose transport delivered the frame
        attempt: u64,
        /// Raw frame text
        payload: String,
    },

    /// Transport reported an error. A `TransportClosed` follows.
    TransportError {
        /// Attempt whose transport failed
        attempt: u64,
        /// Human-readable reason
        reason: String,
    },

    /// Transport closed for any reason.
    TransportClosed {
        /// Attempt whose transport closed
        attempt: u64,
    },

    /// User edited the buffer.
    LocalEdit {
        /// Full buffer after the edit
        buffer: String,
        /// Caret offset in characters after the edit
        cursor: usize,
    },

    /// User moved the caret without editing.
    CursorMoved {
        /// New caret offset in characters
        cursor: usize,
    },

    /// User picked a language.
    SelectLanguage {
        /// Newly selected language
        language: Language,
    },

    /// User dismissed the shown suggestion.
    DismissSuggestion,

    /// Suggestion service finished a request.
    SuggestionCompleted {
        /// Id from the matching `RequestSuggestion` action
        request_id: u64,
        /// Service answer, or a failure description
        outcome: Result<AutocompleteResponse, String>,
    },

    /// Time passed. Fires due reconnect and debounce timers.
    ///
    /// Callers should tick at [`Client::next_deadline`](crate::Client::next_deadline).
    Tick,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open a transport to `url` and report its events tagged with `attempt`.
    Connect {
        /// Attempt number
        attempt: u64,
        /// Room endpoint
        url: String,
    },

    /// Send a text frame on the transport of `attempt`.
    Transmit {
        /// Attempt whose transport carries the frame
        attempt: u64,
        /// Encoded envelope
        payload: String,
    },

    /// Tear down the transport of `attempt`.
    Disconnect {
        /// Attempt to release
        attempt: u64,
    },

    /// Ask the suggestion service for a completion.
    RequestSuggestion {
        /// Id to report back in `SuggestionCompleted`
        request_id: u64,
        /// Request body
        request: AutocompleteRequest,
    },

    /// Visible state changed; re-render.
    StateChanged,
}

impl From<ConnectionAction> for ClientAction {
    fn from(action: ConnectionAction) -> Self {
        match action {
            ConnectionAction::Connect { attempt, url } => Self::Connect { attempt, url },
            ConnectionAction::Transmit { attempt, payload } => Self::Transmit { attempt, payload },
            ConnectionAction::Disconnect { attempt } => Self::Disconnect { attempt },
        }
    }
}
