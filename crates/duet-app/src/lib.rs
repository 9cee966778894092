//! Application layer for Duet
//!
//! Generic runtime for one room view, so the same orchestration code runs in
//! production and in deterministic simulation.
//!
//! # Components
//!
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`SystemEnv`]: Real-clock [`Environment`](duet_core::Environment)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod runtime;
mod system_env;

pub use driver::{Driver, DriverInput};
pub use runtime::Runtime;
pub use system_env::SystemEnv;
