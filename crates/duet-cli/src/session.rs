//! One terminal session: resolve the room, then run its view.

use std::io::Write;

use duet_app::{Runtime, SystemEnv};
use duet_client::services::HttpServices;
use duet_proto::{Language, RoomId};

use crate::{Cli, CliError, Mode, TerminalDriver};

/// Resolve the room named by `cli` and run its view until the user quits.
///
/// # Errors
///
/// - `CliError::Config` for inconsistent flags
/// - `CliError::Service` if a room cannot be created
/// - `CliError::Io` if the terminal fails
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.client_config()?;
    let services = HttpServices::new(&cli.api_url)?;
    let (room_id, language) = resolve_room(&services, &cli).await?;

    writeln!(
        std::io::stdout(),
        "Joined room {room_id} ({language}). Type lines to append, :q to leave."
    )?;
    tracing::info!(%room_id, %language, ws_base = %config.ws_base, "opening room view");

    let driver = TerminalDriver::new(tokio::io::stdin(), std::io::stdout(), services);
    Runtime::new(driver, SystemEnv::new(), room_id, language, config).run().await
}

async fn resolve_room(services: &HttpServices, cli: &Cli) -> Result<(RoomId, Language), CliError> {
    match &cli.mode {
        Mode::Create => {
            let room = services.create_room(cli.language).await?;
            tracing::info!(room_id = %room.room_id, created_at = ?room.created_at, "room created");
            Ok((room.room_id, room.language))
        },
        Mode::Join { room_id } => match services.get_room(room_id).await {
            Ok(room) => Ok((room.room_id, room.language)),
            Err(error) => {
                tracing::warn!(
                    %room_id,
                    %error,
                    fallback = %cli.language,
                    "room lookup failed, using configured language"
                );
                Ok((room_id.clone(), cli.language))
            },
        },
    }
}
