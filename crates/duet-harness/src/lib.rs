//! Deterministic simulation harness for Duet room views.
//!
//! Virtual-time implementations of the Environment and Driver traits plus an
//! in-memory collaboration server, so synchronization behavior can be tested
//! end to end and reproducibly.
//!
//! # Cluster Testing
//!
//! [`TestCluster`] wires several clients to one [`SimRoomServer`] without any
//! async runtime. It is the workhorse for convergence and timer properties.
//!
//! # Runtime Testing
//!
//! [`SimDriver`] runs the production [`duet_app::Runtime`] from a script of
//! [`ScriptStep`]s, exercising the same orchestration the terminal uses.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cluster;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;
pub mod suggester;

pub use cluster::{PeerStats, TestCluster};
pub use sim_driver::{ScriptStep, SimDriver, SimDriverError};
pub use sim_env::{SIM_EPOCH_MILLIS, SimEnv, SimInstant};
pub use sim_server::{ConnId, ROOM_NOT_FOUND, SharedRoomServer, SimRoomServer, create_shared_server};
pub use suggester::{FALLBACK_CONFIDENCE, MATCH_CONFIDENCE, PatternSuggester};
