//! Terminal client for Duet
//!
//! A thin shell over [`duet_app::Driver`] that provides line-oriented
//! terminal I/O. All orchestration logic lives in the generic
//! [`duet_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod config;
pub mod error;
pub mod session;
pub mod terminal;
pub mod view;

pub use command::LineCommand;
pub use config::{Cli, Mode};
pub use error::CliError;
pub use session::run;
pub use terminal::TerminalDriver;
