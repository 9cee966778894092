//! Room view synchronization state.
//!
//! The single read/write surface shared by the connection manager, the inbound
//! dispatcher and the coalescer. It holds no logic beyond its invariants:
//!
//! - the buffer is only ever replaced whole
//! - a local edit clears any pending suggestion
//! - connection status is written only by [`ConnectionManager`]
//! - suggestion fields are written only by [`Coalescer`] (and cleared by the
//!   user dismissing)
//!
//! Cursor positions are character offsets, matching what the autocomplete
//! service expects.
//!
//! [`ConnectionManager`]: crate::ConnectionManager
//! [`Coalescer`]: crate::Coalescer

use duet_proto::{Language, RoomId};

/// Connectivity as shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No live transport (initial state, or waiting to reconnect).
    #[default]
    Disconnected,
    /// Transport established.
    Connected,
}

/// Authoritative local view of one room.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    room_id: RoomId,
    language: Language,
    connection_status: ConnectionStatus,
    buffer: String,
    cursor: usize,
    participant_count: u32,
    pending_suggestion: Option<String>,
    suggestion_loading: bool,
}

impl SyncState {
    /// Fresh state for a room view: disconnected, empty buffer.
    pub fn new(room_id: RoomId, language: Language) -> Self {
        Self {
            room_id,
            language,
            connection_status: ConnectionStatus::Disconnected,
            buffer: String::new(),
            cursor: 0,
            participant_count: 0,
            pending_suggestion: None,
            suggestion_loading: false,
        }
    }

    /// Room this view belongs to.
    #[must_use]
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Selected language.
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Connectivity badge.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection_status
    }

    /// Whether the transport is established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection_status == ConnectionStatus::Connected
    }

    /// Full document text.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Caret offset in characters. Always `<= buffer.chars().count()`.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Participant count as last reported by the server.
    #[must_use]
    pub fn participant_count(&self) -> u32 {
        self.participant_count
    }

    /// Suggestion ready to show, if any.
    #[must_use]
    pub fn pending_suggestion(&self) -> Option<&str> {
        self.pending_suggestion.as_deref()
    }

    /// Whether a suggestion request is in flight.
    #[must_use]
    pub fn suggestion_loading(&self) -> bool {
        self.suggestion_loading
    }

    /// Record a local edit: replace the buffer, move the cursor and drop any
    /// pending suggestion.
    pub fn apply_local_edit(&mut self, buffer: String, cursor: usize) {
        self.buffer = buffer;
        self.cursor = self.clamp_cursor(cursor);
        self.pending_suggestion = None;
    }

    /// Overwrite the buffer with remote content.
    ///
    /// The cursor is clamped to the new length. The pending suggestion is left
    /// alone: only local edits invalidate it.
    pub fn replace_buffer(&mut self, buffer: String) {
        self.buffer = buffer;
        self.cursor = self.clamp_cursor(self.cursor);
    }

    /// Move the caret without editing.
    pub fn set_cursor_position(&mut self, cursor: usize) {
        self.cursor = self.clamp_cursor(cursor);
    }

    /// Overwrite the participant count with the server's value.
    pub fn set_participant_count(&mut self, count: u32) {
        self.participant_count = count;
    }

    /// Change the selected language. Used by the next suggestion request.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    /// Drop the pending suggestion (user dismissed it).
    pub fn clear_suggestion(&mut self) {
        self.pending_suggestion = None;
    }

    pub(crate) fn set_connection_status(&mut self, status: ConnectionStatus) {
        self.connection_status = status;
    }

    pub(crate) fn offer_suggestion(&mut self, suggestion: String) {
        self.pending_suggestion = Some(suggestion);
    }

    pub(crate) fn set_suggestion_loading(&mut self, loading: bool) {
        self.suggestion_loading = loading;
    }

    fn clamp_cursor(&self, cursor: usize) -> usize {
        cursor.min(self.buffer.chars().count())
    }
}
