//! Room transport envelopes.
//!
//! Inbound envelopes are decoded leniently: unknown `type` values map to
//! [`InboundMessage::Unknown`] and unknown fields are ignored, so a newer
//! server never breaks an older client. Malformed payloads (bad JSON, a known
//! `type` with missing or mistyped fields) fail with [`ProtocolError::Decode`].
//! Informational fields (`init.language`, `code_update.timestamp`) never fail
//! an envelope; values this client cannot represent decode as `None`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{errors::ProtocolError, room::Language};

/// Envelope received from the collaboration server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Snapshot sent once per connection establishment.
    Init {
        /// Full document text.
        code: String,
        /// Participants currently in the room, including this client.
        users_count: u32,
        /// Room language, when the server reports it.
        #[serde(
            default,
            deserialize_with = "lenient_language",
            skip_serializing_if = "Option::is_none"
        )]
        language: Option<Language>,
    },

    /// Full-document overwrite from another participant.
    CodeUpdate {
        /// Full document text.
        code: String,
        /// Sender's wall-clock millis. Informational only.
        #[serde(
            default,
            deserialize_with = "lenient_timestamp",
            skip_serializing_if = "Option::is_none"
        )]
        timestamp: Option<u64>,
    },

    /// A participant joined.
    UserJoined {
        /// New participant count.
        users_count: u32,
    },

    /// A participant left.
    UserLeft {
        /// New participant count.
        users_count: u32,
    },

    /// Server-reported problem (e.g. unknown room). Diagnostic only.
    Error {
        /// Human-readable description.
        message: String,
    },

    /// Any other envelope kind. Ignored.
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Decode a transport payload.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the payload is not a JSON object with a
    ///   `type` field, or a recognised kind is missing required fields
    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(payload).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    /// Encode as JSON. Used by simulated servers.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Wire name of the envelope kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::CodeUpdate { .. } => "code_update",
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::Error { .. } => "error",
            Self::Unknown => "unknown",
        }
    }
}

/// Rooms may carry languages this client does not offer, in any casing.
fn lenient_language<'de, D>(deserializer: D) -> Result<Option<Language>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(name)) => name.parse().ok(),
        _ => None,
    })
}

/// The server forwards whatever the sender stamped.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.as_ref().and_then(Value::as_u64))
}

/// Envelope sent to the collaboration server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Whole-document update after a local edit.
    CodeUpdate {
        /// Full document text.
        code: String,
        /// Sender's wall-clock millis.
        timestamp: u64,
    },
}

impl OutboundMessage {
    /// Build a whole-document update.
    pub fn code_update(code: impl Into<String>, timestamp: u64) -> Self {
        Self::CodeUpdate { code: code.into(), timestamp }
    }

    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decode an outbound envelope. Used by simulated servers.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Decode` if the payload is not a valid outbound envelope
    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(payload).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_init() {
        let msg = InboundMessage::decode(r#"{"type":"init","code":"x = 1","users_count":2}"#)
            .unwrap();
        assert_eq!(
            msg,
            InboundMessage::Init { code: "x = 1".into(), users_count: 2, language: None }
        );
    }

    #[test]
    fn decode_init_with_language() {
        let msg = InboundMessage::decode(
            r#"{"type":"init","code":"","users_count":1,"language":"typescript"}"#,
        )
        .unwrap();
        assert!(matches!(msg, InboundMessage::Init { language: Some(Language::Typescript), .. }));
    }

    #[test]
    fn decode_code_update_ignores_extra_fields() {
        let msg = InboundMessage::decode(
            r#"{"type":"code_update","code":"abc","timestamp":17,"sender":"xyz"}"#,
        )
        .unwrap();
        assert_eq!(msg, InboundMessage::CodeUpdate { code: "abc".into(), timestamp: Some(17) });
    }

    #[test]
    fn unrepresentable_language_still_decodes_init() {
        for (language, expected) in [
            (r#""go""#, None),
            (r#""Python""#, Some(Language::Python)),
            ("null", None),
            ("7", None),
        ] {
            let payload =
                format!(r#"{{"type":"init","code":"hello","users_count":2,"language":{language}}}"#);
            assert_eq!(
                InboundMessage::decode(&payload).unwrap(),
                InboundMessage::Init { code: "hello".into(), users_count: 2, language: expected },
                "language {language}"
            );
        }
    }

    #[test]
    fn odd_timestamp_still_decodes_code_update() {
        for timestamp in ["1700000000000.5", "-3", r#""yesterday""#, "null"] {
            let payload = format!(r#"{{"type":"code_update","code":"world","timestamp":{timestamp}}}"#);
            assert_eq!(
                InboundMessage::decode(&payload).unwrap(),
                InboundMessage::CodeUpdate { code: "world".into(), timestamp: None },
                "timestamp {timestamp}"
            );
        }
    }

    #[test]
    fn decode_presence() {
        assert_eq!(
            InboundMessage::decode(r#"{"type":"user_joined","users_count":3}"#).unwrap(),
            InboundMessage::UserJoined { users_count: 3 }
        );
        assert_eq!(
            InboundMessage::decode(r#"{"type":"user_left","users_count":0}"#).unwrap(),
            InboundMessage::UserLeft { users_count: 0 }
        );
    }

    #[test]
    fn decode_error_envelope() {
        let msg = InboundMessage::decode(r#"{"type":"error","message":"Room not found"}"#).unwrap();
        assert_eq!(msg, InboundMessage::Error { message: "Room not found".into() });
    }

    #[test]
    fn unknown_kind_is_tolerated() {
        let msg =
            InboundMessage::decode(r#"{"type":"cursor_position","line":3,"column":4}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unknown);
        assert_eq!(msg.kind(), "unknown");
    }

    #[test]
    fn malformed_payloads_fail() {
        for payload in [
            "",
            "not json",
            "[]",
            r#"{"code":"no type"}"#,
            r#"{"type":"init","code":"x"}"#,
            r#"{"type":"user_joined","users_count":"two"}"#,
            r#"{"type":"user_left","users_count":-1}"#,
        ] {
            assert!(
                matches!(InboundMessage::decode(payload), Err(ProtocolError::Decode(_))),
                "payload {payload:?} should fail"
            );
        }
    }

    #[test]
    fn outbound_code_update_shape() {
        let json = OutboundMessage::code_update("def f():", 1_700_000_000_000).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "code_update");
        assert_eq!(value["code"], "def f():");
        assert_eq!(value["timestamp"], 1_700_000_000_000_u64);
    }

    #[test]
    fn outbound_is_readable_as_inbound() {
        let json = OutboundMessage::code_update("y", 5).encode().unwrap();
        assert_eq!(
            InboundMessage::decode(&json).unwrap(),
            InboundMessage::CodeUpdate { code: "y".into(), timestamp: Some(5) }
        );
    }
}
