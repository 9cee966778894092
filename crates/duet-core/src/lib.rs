//! Duet synchronization core.
//!
//! Pure state machines for one open room view. Nothing here performs I/O or
//! reads the clock: callers pass `now` in and execute the returned actions.
//!
//! - [`SyncState`]: the room view's authoritative local state
//! - [`ConnectionManager`]: transport lifecycle with fixed-delay reconnection
//! - [`Coalescer`]: debounced autocomplete requests with staleness checks
//! - [`Timer`]: single cancellable deadline slot used by both machines

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod coalescer;
pub mod connection;
pub mod env;
pub mod error;
pub mod state;
pub mod timer;

pub use coalescer::{
    Coalescer, CoalescerConfig, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_QUIET_PERIOD,
    SuggestionRequest,
};
pub use connection::{
    ConnectionAction, ConnectionConfig, ConnectionManager, ConnectionPhase,
    DEFAULT_RECONNECT_DELAY,
};
pub use env::{Environment, Moment};
pub use error::SendError;
pub use state::{ConnectionStatus, SyncState};
pub use timer::Timer;
