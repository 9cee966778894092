//! Command-line configuration.

use std::time::Duration;

use clap::{Parser, Subcommand};
use duet_client::{ClientConfig, services::DEFAULT_API_BASE};
use duet_core::{CoalescerConfig, ConnectionConfig};
use duet_proto::{Language, RoomId};

use crate::CliError;

/// Duet collaborative editor, terminal edition
#[derive(Parser, Debug)]
#[command(name = "duet")]
#[command(about = "Join a Duet room and edit its shared buffer from the terminal")]
#[command(version)]
pub struct Cli {
    /// REST API base for room and autocomplete services
    #[arg(long, env = "DUET_API_URL", default_value = DEFAULT_API_BASE)]
    pub api_url: String,

    /// WebSocket base; the room endpoint is <ws-url>/rooms/ws/<room-id>
    #[arg(long, env = "DUET_WS_URL", default_value = duet_client::DEFAULT_WS_BASE)]
    pub ws_url: String,

    /// Language for new rooms, and for joined rooms the server cannot describe
    #[arg(long, default_value = "python")]
    pub language: Language,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Delay before reconnecting a dropped room connection
    #[arg(long, default_value_t = 3000)]
    pub reconnect_delay_ms: u64,

    /// Quiet period after the last edit before asking for a suggestion
    #[arg(long, default_value_t = 600)]
    pub quiet_period_ms: u64,

    /// Suggestions at or below this confidence are not shown
    #[arg(long, default_value_t = 0.5)]
    pub confidence_threshold: f64,

    /// What to do
    #[command(subcommand)]
    pub mode: Mode,
}

/// Room to open.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Create a new room and open it
    Create,
    /// Open an existing room
    Join {
        /// Room id as shared by its creator
        room_id: RoomId,
    },
}

impl Cli {
    /// Room view configuration from the flags.
    ///
    /// # Errors
    ///
    /// - `CliError::Config` if the confidence threshold is outside [0, 1]
    pub fn client_config(&self) -> Result<ClientConfig, CliError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CliError::Config(format!(
                "confidence threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }

        Ok(ClientConfig {
            ws_base: self.ws_url.clone(),
            connection: ConnectionConfig {
                reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            },
            coalescer: CoalescerConfig {
                quiet_period: Duration::from_millis(self.quiet_period_ms),
                confidence_threshold: self.confidence_threshold,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use duet_core::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_QUIET_PERIOD, DEFAULT_RECONNECT_DELAY};

    use super::*;

    #[test]
    fn defaults_match_library_defaults() {
        let cli = Cli::try_parse_from(["duet", "create"]).unwrap();
        let config = cli.client_config().unwrap();

        assert_eq!(cli.mode, Mode::Create);
        assert_eq!(cli.language, Language::Python);
        assert_eq!(config.connection.reconnect_delay, DEFAULT_RECONNECT_DELAY);
        assert_eq!(config.coalescer.quiet_period, DEFAULT_QUIET_PERIOD);
        assert!((config.coalescer.confidence_threshold - DEFAULT_CONFIDENCE_THRESHOLD).abs() < f64::EPSILON);
    }

    #[test]
    fn join_takes_room_id() {
        let cli = Cli::try_parse_from([
            "duet",
            "--ws-url",
            "ws://example:9000",
            "--language",
            "javascript",
            "join",
            "abc123",
        ])
        .unwrap();

        assert_eq!(cli.mode, Mode::Join { room_id: RoomId::new("abc123").unwrap() });
        assert_eq!(cli.language, Language::Javascript);
        assert_eq!(cli.client_config().unwrap().ws_base, "ws://example:9000");
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(Cli::try_parse_from(["duet", "join", "a/b"]).is_err());
        assert!(Cli::try_parse_from(["duet", "--language", "cobol", "create"]).is_err());

        let cli = Cli::try_parse_from(["duet", "--confidence-threshold", "1.5", "create"]).unwrap();
        assert!(matches!(cli.client_config(), Err(CliError::Config(_))));
    }
}
