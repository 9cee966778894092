//! Inbound envelope dispatch.
//!
//! Applies one decoded envelope to the synchronization state. Called
//! synchronously per received frame, in receipt order.
//!
//! Every rule is an overwrite: the buffer is replaced whole and the participant
//! count is whatever the server last said. Applying the same envelope twice
//! therefore leaves the state as applying it once.

use duet_core::SyncState;
use duet_proto::InboundMessage;

/// Apply `message` to `state`.
///
/// Returns `true` if the message kind affects visible state.
pub fn apply(state: &mut SyncState, message: &InboundMessage) -> bool {
    match message {
        InboundMessage::Init { code, users_count, language } => {
            tracing::debug!(
                room_id = %state.room_id(),
                users_count,
                server_language = ?language,
                len = code.len(),
                "room snapshot received"
            );
            state.replace_buffer(code.clone());
            state.set_participant_count(*users_count);
            true
        },
        InboundMessage::CodeUpdate { code, .. } => {
            state.replace_buffer(code.clone());
            true
        },
        InboundMessage::UserJoined { users_count } | InboundMessage::UserLeft { users_count } => {
            state.set_participant_count(*users_count);
            true
        },
        InboundMessage::Error { message } => {
            tracing::warn!(room_id = %state.room_id(), %message, "server reported error");
            false
        },
        InboundMessage::Unknown => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use duet_proto::{Language, RoomId};

    use super::*;

    fn state() -> SyncState {
        SyncState::new(RoomId::new("room").unwrap(), Language::Python)
    }

    #[test]
    fn init_overwrites_buffer_and_count() {
        let mut s = state();
        s.apply_local_edit("local".into(), 5);

        let init = InboundMessage::Init { code: "remote".into(), users_count: 3, language: None };
        assert!(apply(&mut s, &init));

        assert_eq!(s.buffer(), "remote");
        assert_eq!(s.participant_count(), 3);
    }

    #[test]
    fn init_is_idempotent() {
        let mut s = state();
        let init = InboundMessage::Init { code: "abc".into(), users_count: 2, language: None };

        apply(&mut s, &init);
        let once = s.clone();
        apply(&mut s, &init);

        assert_eq!(s, once);
    }

    #[test]
    fn init_language_does_not_override_selection() {
        let mut s = state();
        s.set_language(Language::Javascript);

        let init = InboundMessage::Init {
            code: String::new(),
            users_count: 1,
            language: Some(Language::Typescript),
        };
        apply(&mut s, &init);

        assert_eq!(s.language(), Language::Javascript);
    }

    #[test]
    fn code_update_is_last_writer_wins() {
        let mut s = state();
        for code in ["one", "two", ""] {
            apply(&mut s, &InboundMessage::CodeUpdate { code: code.into(), timestamp: Some(0) });
        }
        assert_eq!(s.buffer(), "");
    }

    #[test]
    fn presence_overwrites_count() {
        let mut s = state();
        apply(&mut s, &InboundMessage::UserJoined { users_count: 5 });
        assert_eq!(s.participant_count(), 5);

        // The server is authoritative even if the value looks inconsistent.
        apply(&mut s, &InboundMessage::UserLeft { users_count: 7 });
        assert_eq!(s.participant_count(), 7);
    }

    #[test]
    fn error_and_unknown_change_nothing() {
        let mut s = state();
        s.apply_local_edit("keep".into(), 4);
        let before = s.clone();

        assert!(!apply(&mut s, &InboundMessage::Error { message: "Room not found".into() }));
        assert!(!apply(&mut s, &InboundMessage::Unknown));

        assert_eq!(s, before);
    }
}
