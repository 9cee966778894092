//! Terminal driver for the CLI.
//!
//! Implements the [`Driver`] trait with line-oriented stdin input, plain-text
//! rendering to stdout, the WebSocket transport and the HTTP autocomplete
//! service. Logs go to stderr so they never interleave with the document.

use std::{io::Write, time::Duration};

use duet_app::{Driver, DriverInput, SystemEnv};
use duet_client::{
    ClientEvent, SuggestionService, TransportError,
    services::HttpServices,
    transport::{self, TransportHandle},
};
use duet_core::{Environment, SyncState};
use duet_proto::AutocompleteRequest;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader, Lines},
    sync::mpsc,
    task::JoinSet,
};

use crate::{CliError, command::LineCommand, view};

/// Transport and suggestion events buffered before their tasks wait.
const EVENT_CAPACITY: usize = 256;

/// What ended a wait for input.
enum Wake {
    Event(ClientEvent),
    Line(Option<String>),
    Timeout,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Owns the transport of the current attempt and every suggestion request in
/// flight; [`Driver::stop`] aborts all of them.
pub struct TerminalDriver<R, W> {
    env: SystemEnv,
    lines: Lines<BufReader<R>>,
    input_closed: bool,
    output: W,
    services: HttpServices,
    events_tx: mpsc::Sender<ClientEvent>,
    events_rx: mpsc::Receiver<ClientEvent>,
    transport: Option<TransportHandle>,
    suggestions: JoinSet<()>,
    /// Buffer as last rendered; plain lines are appended to it.
    buffer: String,
}

impl<R, W> TerminalDriver<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: Write + Send,
{
    /// Create a driver reading commands from `input` and rendering to
    /// `output`.
    pub fn new(input: R, output: W, services: HttpServices) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        Self {
            env: SystemEnv::new(),
            lines: BufReader::new(input).lines(),
            input_closed: false,
            output,
            services,
            events_tx,
            events_rx,
            transport: None,
            suggestions: JoinSet::new(),
            buffer: String::new(),
        }
    }

    fn handle_line(&mut self, line: Option<String>) -> Result<Option<DriverInput>, CliError> {
        let Some(line) = line else {
            tracing::debug!("stdin closed");
            self.input_closed = true;
            return Ok(Some(DriverInput::Quit));
        };

        match LineCommand::parse(&line) {
            Ok(command) => Ok(Some(command.into_input(&self.buffer))),
            Err(message) => {
                writeln!(self.output, "!! {message}")?;
                Ok(None)
            },
        }
    }
}

impl<R, W> Driver for TerminalDriver<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: Write + Send,
{
    type Error = CliError;

    async fn next_input(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<DriverInput>, Self::Error> {
        let env = self.env;
        let deadline = async move {
            match timeout {
                Some(timeout) => env.sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        let wake = tokio::select! {
            biased;

            Some(event) = self.events_rx.recv() => Wake::Event(event),

            line = self.lines.next_line(), if !self.input_closed => Wake::Line(line?),

            () = deadline => Wake::Timeout,
        };

        match wake {
            Wake::Event(event) => Ok(Some(DriverInput::Client(event))),
            Wake::Line(line) => self.handle_line(line),
            Wake::Timeout => Ok(None),
        }
    }

    fn connect(&mut self, attempt: u64, url: &str) {
        // Replacing the handle aborts any previous attempt.
        self.transport =
            Some(transport::spawn_connection(attempt, url.to_string(), self.events_tx.clone()));
    }

    fn transmit(&mut self, attempt: u64, payload: String) -> Result<(), Self::Error> {
        match &self.transport {
            Some(handle) if handle.attempt() == attempt => Ok(handle.send(payload)?),
            _ => Err(TransportError::Closed.into()),
        }
    }

    fn disconnect(&mut self, attempt: u64) {
        if let Some(handle) = self.transport.take_if(|handle| handle.attempt() == attempt) {
            handle.close();
        }
    }

    fn request_suggestion(&mut self, request_id: u64, request: AutocompleteRequest) {
        while self.suggestions.try_join_next().is_some() {}

        let services = self.services.clone();
        let events = self.events_tx.clone();
        self.suggestions.spawn(async move {
            let outcome = services.suggest(request).await.map_err(|error| {
                tracing::debug!(
                    request_id,
                    %error,
                    transient = error.is_transient(),
                    "autocomplete call failed"
                );
                error.to_string()
            });
            if events.send(ClientEvent::SuggestionCompleted { request_id, outcome }).await.is_err() {
                tracing::debug!(request_id, "room view gone before suggestion arrived");
            }
        });
    }

    fn render(&mut self, state: &SyncState) -> Result<(), Self::Error> {
        self.buffer.clear();
        self.buffer.push_str(state.buffer());
        self.output.write_all(view::render(state).as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(handle) = self.transport.take() {
            handle.stop();
        }
        self.suggestions.abort_all();
        self.events_rx.close();
    }
}
