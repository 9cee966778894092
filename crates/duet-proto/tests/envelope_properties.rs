//! Property-based tests for envelope decoding.
//!
//! Decoding is the client's only contact with untrusted input. These tests
//! check that it never panics, that document text survives byte-for-byte, and
//! that unknown envelope kinds are tolerated rather than rejected.

use duet_proto::{InboundMessage, OutboundMessage, RoomId};
use proptest::prelude::*;

/// Envelope kinds the client does not act on.
fn unknown_kind() -> impl Strategy<Value = String> {
    "[a-z_]{1,20}".prop_filter("must not be a known kind", |kind| {
        !matches!(kind.as_str(), "init" | "code_update" | "user_joined" | "user_left" | "error")
    })
}

proptest! {
    #[test]
    fn prop_decode_never_panics(payload in ".*") {
        let _ = InboundMessage::decode(&payload);
    }

    #[test]
    fn prop_decode_never_panics_on_json_objects(
        kind in "[a-z_]{0,12}",
        key in "[a-z_]{1,12}",
        value in any::<i64>(),
    ) {
        let payload = format!(r#"{{"type":"{kind}","{key}":{value}}}"#);
        let _ = InboundMessage::decode(&payload);
    }

    #[test]
    fn prop_code_update_preserves_text(code in any::<String>(), timestamp in any::<u64>()) {
        let wire = OutboundMessage::code_update(code.clone(), timestamp).encode().unwrap();

        // The server rebroadcasts the same shape; the client must read back
        // exactly what the sender wrote.
        let decoded = InboundMessage::decode(&wire).unwrap();
        prop_assert_eq!(decoded, InboundMessage::CodeUpdate { code, timestamp: Some(timestamp) });
    }

    #[test]
    fn prop_init_preserves_text_and_count(code in any::<String>(), users in any::<u32>()) {
        let payload = serde_json::json!({ "type": "init", "code": code, "users_count": users });
        let decoded = InboundMessage::decode(&payload.to_string()).unwrap();
        prop_assert_eq!(
            decoded,
            InboundMessage::Init { code, users_count: users, language: None }
        );
    }

    #[test]
    fn prop_unknown_kinds_decode_to_unknown(kind in unknown_kind(), extra in any::<String>()) {
        let payload = serde_json::json!({ "type": kind, "payload": extra });
        prop_assert_eq!(InboundMessage::decode(&payload.to_string()).unwrap(), InboundMessage::Unknown);
    }

    #[test]
    fn prop_room_id_validation(id in "\\PC*") {
        let valid = !id.is_empty() && !id.contains('/') && !id.chars().any(char::is_whitespace);
        prop_assert_eq!(RoomId::new(id).is_ok(), valid);
    }
}
