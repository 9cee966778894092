//! Plain-text rendering of a room view.

use std::fmt::Write as _;

use duet_core::{ConnectionStatus, SyncState};

/// Render `state` as a status line, the buffer, and the suggestion if any.
pub fn render(state: &SyncState) -> String {
    let status = match state.connection_status() {
        ConnectionStatus::Connected => "connected",
        ConnectionStatus::Disconnected => "disconnected",
    };
    let users = match state.participant_count() {
        1 => "1 user".to_string(),
        n => format!("{n} users"),
    };

    let mut out = format!(
        "== room {} | {} | {} | {} | cursor {} ==\n",
        state.room_id(),
        state.language(),
        status,
        users,
        state.cursor()
    );
    for (number, line) in state.buffer().lines().enumerate() {
        let _ = writeln!(out, "{:>4} | {line}", number + 1);
    }

    if state.suggestion_loading() {
        out.push_str("-- thinking... --\n");
    }
    if let Some(suggestion) = state.pending_suggestion() {
        out.push_str("-- suggestion (:dismiss to hide) --\n");
        for line in suggestion.lines() {
            let _ = writeln!(out, "     + {line}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use duet_proto::{Language, RoomId};

    use super::*;

    #[test]
    fn renders_status_and_numbered_buffer() {
        let mut state = SyncState::new(RoomId::new("r1").unwrap(), Language::Python);
        state.apply_local_edit("x = 1\ny = 2".into(), 3);
        state.set_participant_count(2);

        assert_eq!(
            render(&state),
            "== room r1 | python | disconnected | 2 users | cursor 3 ==\n   1 | x = 1\n   2 | y = 2\n"
        );
    }

    #[test]
    fn empty_buffer_has_only_status() {
        let state = SyncState::new(RoomId::new("r1").unwrap(), Language::Javascript);
        assert_eq!(render(&state), "== room r1 | javascript | disconnected | 0 users | cursor 0 ==\n");
    }
}
