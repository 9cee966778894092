//! Client
//!
//! Action-based room view for the Duet collaboration protocol. Owns the
//! synchronization state of one open room and the two state machines that
//! act on it.
//!
//! # Architecture
//!
//! The client follows the Sans-IO pattern of [`duet_core`]. It receives events
//! ([`ClientEvent`]), processes them synchronously one at a time, and returns
//! actions ([`ClientAction`]) for the caller to execute. Inbound frames are
//! applied by [`dispatch::apply`] in receipt order.
//!
//! # Components
//!
//! - [`Client`]: room view orchestrator
//! - [`ClientEvent`]: transport, user and timer events fed into the client
//! - [`ClientAction`]: transport and service work produced by the client
//! - [`SuggestionService`]: seam for the autocomplete collaborator
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::spawn_connection`]: WebSocket task for one attempt
//! - [`services::HttpServices`]: room and autocomplete REST collaborators

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
pub mod dispatch;
mod error;
mod event;
mod service;

#[cfg(feature = "transport")]
pub mod services;
#[cfg(feature = "transport")]
pub mod transport;

pub use client::{Client, ClientConfig, DEFAULT_WS_BASE, room_endpoint};
pub use duet_core::{ConnectionStatus, Environment, SyncState};
pub use duet_proto::{Language, RoomId};
pub use error::{ServiceError, TransportError};
pub use event::{ClientAction, ClientEvent};
pub use service::SuggestionService;
