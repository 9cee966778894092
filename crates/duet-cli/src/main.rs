//! Duet terminal client entry point.
//!
//! # Usage
//!
//! ```bash
//! # Create a room and start editing
//! duet --api-url http://localhost:8000 create
//!
//! # Join a room someone shared
//! duet --ws-url ws://localhost:8000 join 3f2a9c
//! ```

use clap::Parser;
use duet_cli::Cli;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(duet_cli::run(cli).await?)
}
