//! REST collaborator payloads.
//!
//! Room creation: `POST <api>/rooms` with [`CreateRoomRequest`], answered by
//! [`RoomInfo`]. Room lookup: `GET <api>/rooms/<id>`, also [`RoomInfo`].
//! Autocomplete: `POST <api>/autocomplete` with [`AutocompleteRequest`],
//! answered by [`AutocompleteResponse`].

use serde::{Deserialize, Serialize};

use crate::room::{Language, RoomId};

/// Body of a room-creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// Initial room language.
    #[serde(default)]
    pub language: Language,
}

/// Room metadata returned by the room service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// Identifier to join with.
    pub room_id: RoomId,
    /// Persisted document text.
    #[serde(default)]
    pub code_content: String,
    /// Room language.
    #[serde(default)]
    pub language: Language,
    /// Creation time as reported by the server. Opaque.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of an autocomplete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocompleteRequest {
    /// Full buffer at dispatch time.
    pub code: String,
    /// Caret offset in characters.
    pub cursor_position: usize,
    /// Language of the buffer.
    pub language: Language,
}

/// Autocomplete answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteResponse {
    /// Suggested completion text.
    pub suggestion: String,
    /// Confidence in `[0, 1]`. Only values strictly above the configured
    /// threshold are surfaced.
    pub confidence: f64,
}
