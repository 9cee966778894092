//! Fuzz target for room envelope decoding
//!
//! Feeds arbitrary text to both envelope decoders.
//!
//! # Invariants
//!
//! - NEVER panic on malformed input
//! - Anything that decodes re-encodes, and the re-encoding decodes to the
//!   same message

#![no_main]

use duet_proto::{InboundMessage, OutboundMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(message) = InboundMessage::decode(text) {
        let encoded = message.encode().unwrap();
        assert_eq!(InboundMessage::decode(&encoded).unwrap(), message);
    }

    if let Ok(message) = OutboundMessage::decode(text) {
        let encoded = message.encode().unwrap();
        assert_eq!(OutboundMessage::decode(&encoded).unwrap(), message);
    }
});
