//! Room identity and language selection.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Opaque room identifier assigned by the room-creation service.
///
/// The client never interprets the contents. The only constraint is that the
/// id is usable as a single URL path segment in `<ws-base>/rooms/ws/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Validate and wrap a room identifier.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidRoomId` if the id is empty or contains `/` or
    ///   whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, ProtocolError> {
        let id = id.into();
        if id.is_empty() || id.contains('/') || id.chars().any(char::is_whitespace) {
            return Err(ProtocolError::InvalidRoomId(id));
        }
        Ok(Self(id))
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RoomId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

/// Language selected for a room. Drives autocomplete suggestions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Python (the default for new rooms).
    #[default]
    Python,
    /// JavaScript.
    Javascript,
    /// TypeScript.
    Typescript,
}

impl Language {
    /// All supported languages, in selector order.
    pub const ALL: [Language; 3] = [Language::Python, Language::Javascript, Language::Typescript];

    /// Wire name of the language.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Javascript => "javascript",
            Self::Typescript => "typescript",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.as_str() == normalized)
            .ok_or_else(|| ProtocolError::UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_id_accepts_uuid() {
        let id = RoomId::new("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(id.as_str(), "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn room_id_rejects_path_breaking_values() {
        assert!(matches!(RoomId::new(""), Err(ProtocolError::InvalidRoomId(_))));
        assert!(matches!(RoomId::new("a/b"), Err(ProtocolError::InvalidRoomId(_))));
        assert!(matches!(RoomId::new("a b"), Err(ProtocolError::InvalidRoomId(_))));
    }

    #[test]
    fn room_id_deserialize_validates() {
        let ok: RoomId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(ok.as_str(), "abc");

        let bad: Result<RoomId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!(" typescript ".parse::<Language>().unwrap(), Language::Typescript);
        assert!(matches!("rust".parse::<Language>(), Err(ProtocolError::UnknownLanguage(_))));
    }

    #[test]
    fn language_wire_names() {
        for lang in Language::ALL {
            let json = serde_json::to_string(&lang).unwrap();
            assert_eq!(json, format!("\"{}\"", lang.as_str()));
        }
        assert_eq!(Language::default(), Language::Python);
    }
}
