//! Duet wire protocol.
//!
//! JSON envelopes exchanged with the collaboration server over the room
//! transport, plus the request/response shapes of the two REST collaborators
//! (room creation and autocomplete).
//!
//! # Envelope Contract
//!
//! Every transport payload is a JSON object with a `"type"` discriminator.
//! Inbound kinds the client reacts to are `init`, `code_update`,
//! `user_joined`, `user_left` and `error`. Any other kind decodes to
//! [`InboundMessage::Unknown`] and is ignored by the client. The only outbound
//! kind is `code_update`, which always carries the whole document.
//!
//! This crate has no I/O and no notion of time; callers supply timestamps.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod rest;
pub mod room;

pub use envelope::{InboundMessage, OutboundMessage};
pub use errors::{ProtocolError, Result};
pub use rest::{AutocompleteRequest, AutocompleteResponse, CreateRoomRequest, RoomInfo};
pub use room::{Language, RoomId};
