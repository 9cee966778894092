//! Fuzz target for the room view state machine
//!
//! Drives one client with arbitrary interleavings of transport, user, timer
//! and suggestion events, including stale attempts and garbage frames.
//!
//! # Invariants
//!
//! - NEVER panic
//! - The cursor never exceeds the buffer length in characters
//! - Connected status implies the connection is open
//! - After `Close`, no timer remains armed and no event produces transport
//!   or suggestion work

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use duet_client::{Client, ClientAction, ClientConfig, ClientEvent};
use duet_harness::SimEnv;
use duet_proto::{AutocompleteResponse, InboundMessage, Language, RoomId};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Open,
    Close,
    Established { attempt: u8 },
    Init { attempt: u8, code: String, users: u8 },
    CodeUpdate { attempt: u8, code: String },
    Garbage { attempt: u8, payload: String },
    Closed { attempt: u8 },
    Edit { buffer: String, cursor: u16 },
    Cursor { cursor: u16 },
    Dismiss,
    Complete { request_id: u8, confidence: u8, ok: bool },
    Advance { ms: u16 },
}

fn frame(attempt: u8, message: &InboundMessage) -> ClientEvent {
    let payload = message.encode().unwrap_or_default();
    ClientEvent::FrameReceived { attempt: u64::from(attempt), payload }
}

fuzz_target!(|ops: Vec<Op>| {
    let env = SimEnv::new();
    let Ok(room_id) = RoomId::new("fuzz-room") else {
        return;
    };
    let mut client = Client::new(env.clone(), room_id, Language::Python, ClientConfig::default());

    for op in ops {
        let event = match op {
            Op::Open => ClientEvent::Open,
            Op::Close => ClientEvent::Close,
            Op::Established { attempt } => {
                ClientEvent::TransportEstablished { attempt: u64::from(attempt) }
            },
            Op::Init { attempt, code, users } => frame(
                attempt,
                &InboundMessage::Init { code, users_count: u32::from(users), language: None },
            ),
            Op::CodeUpdate { attempt, code } => {
                frame(attempt, &InboundMessage::CodeUpdate { code, timestamp: None })
            },
            Op::Garbage { attempt, payload } => {
                ClientEvent::FrameReceived { attempt: u64::from(attempt), payload }
            },
            Op::Closed { attempt } => ClientEvent::TransportClosed { attempt: u64::from(attempt) },
            Op::Edit { buffer, cursor } => {
                ClientEvent::LocalEdit { buffer, cursor: usize::from(cursor) }
            },
            Op::Cursor { cursor } => ClientEvent::CursorMoved { cursor: usize::from(cursor) },
            Op::Dismiss => ClientEvent::DismissSuggestion,
            Op::Complete { request_id, confidence, ok } => ClientEvent::SuggestionCompleted {
                request_id: u64::from(request_id),
                outcome: if ok {
                    Ok(AutocompleteResponse {
                        suggestion: "pass".into(),
                        confidence: f64::from(confidence) / 255.0,
                    })
                } else {
                    Err("unavailable".into())
                },
            },
            Op::Advance { ms } => {
                env.advance(Duration::from_millis(u64::from(ms)));
                ClientEvent::Tick
            },
        };

        let was_closed = client.is_closed();
        let is_close = matches!(event, ClientEvent::Close);
        let is_open = matches!(event, ClientEvent::Open);
        let actions = client.handle(event);

        let state = client.state();
        assert!(state.cursor() <= state.buffer().chars().count());

        if is_close {
            assert!(!client.has_pending_timers());
        } else if was_closed && !is_open {
            assert!(actions.iter().all(|action| matches!(action, ClientAction::StateChanged)));
        }
    }
});
