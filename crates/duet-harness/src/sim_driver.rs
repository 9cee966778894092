//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`duet_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Input comes from a script. Connections go to a [`SharedRoomServer`],
//! suggestions are answered immediately by a [`PatternSuggester`], and waits
//! move a [`SimEnv`] clock instead of sleeping.

use std::{
    collections::VecDeque,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use duet_app::{Driver, DriverInput};
use duet_client::ClientEvent;
use duet_core::{Environment, SyncState};
use duet_proto::{AutocompleteRequest, RoomId};

use crate::{
    sim_env::{SimEnv, SimInstant},
    sim_server::{ConnId, SharedRoomServer, SimRoomServer},
    suggester::PatternSuggester,
};

/// Error type for simulation driver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimDriverError {
    /// No live transport for the attempt.
    #[error("no transport for attempt {attempt}")]
    NotConnected {
        /// Attempt the frame was meant for
        attempt: u64,
    },

    /// Driver was used after [`Driver::stop`].
    #[error("driver stopped")]
    Stopped,
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Deliver an input to the runtime.
    Input(DriverInput),
    /// Let virtual time pass. Timers falling due inside the wait fire at
    /// their exact deadline.
    Wait(Duration),
    /// Drop the live connection as a network failure would.
    DropConnection,
    /// Make the server accept or refuse new connections.
    ServerOnline(bool),
}

impl ScriptStep {
    /// Local edit placing the cursor at the end of `text`.
    pub fn edit(text: &str) -> Self {
        Self::Input(DriverInput::Client(ClientEvent::LocalEdit {
            buffer: text.to_string(),
            cursor: text.chars().count(),
        }))
    }

    /// Wait `ms` milliseconds.
    pub fn wait_ms(ms: u64) -> Self {
        Self::Wait(Duration::from_millis(ms))
    }

    /// Leave the room view.
    pub fn quit() -> Self {
        Self::Input(DriverInput::Quit)
    }
}

#[derive(Debug, Clone, Copy)]
struct Link {
    attempt: u64,
    conn: ConnId,
}

/// Shared state so tests can observe a driver owned by a runtime.
#[derive(Default)]
struct SharedState {
    script: VecDeque<ScriptStep>,
    events: VecDeque<ClientEvent>,
    link: Option<Link>,
    renders: Vec<SyncState>,
    connects: Vec<(SimInstant, u64)>,
    transmitted: Vec<String>,
    suggestion_requests: Vec<(SimInstant, AutocompleteRequest)>,
    stopped: bool,
}

/// Simulation driver for deterministic testing.
///
/// Clones share state: keep one to inspect what the runtime did after
/// handing the other to [`duet_app::Runtime`].
#[derive(Clone)]
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    server: SharedRoomServer,
    env: SimEnv,
    suggester: PatternSuggester,
}

impl SimDriver {
    /// Driver running `script` against `server` on `env`'s clock.
    ///
    /// Once the script is exhausted the driver reports [`DriverInput::Quit`].
    pub fn new(
        env: SimEnv,
        server: SharedRoomServer,
        script: impl IntoIterator<Item = ScriptStep>,
    ) -> Self {
        let state = SharedState { script: script.into_iter().collect(), ..SharedState::default() };
        Self {
            state: Arc::new(Mutex::new(state)),
            server,
            env,
            suggester: PatternSuggester::new(),
        }
    }

    /// Every state rendered so far.
    pub fn renders(&self) -> Vec<SyncState> {
        self.lock().renders.clone()
    }

    /// Most recently rendered state.
    pub fn last_render(&self) -> Option<SyncState> {
        self.lock().renders.last().cloned()
    }

    /// Connect requests as (virtual time, attempt).
    pub fn connects(&self) -> Vec<(SimInstant, u64)> {
        self.lock().connects.clone()
    }

    /// Frames handed to the server.
    pub fn transmitted(&self) -> Vec<String> {
        self.lock().transmitted.clone()
    }

    /// Suggestion requests as (virtual time, request).
    pub fn suggestion_requests(&self) -> Vec<(SimInstant, AutocompleteRequest)> {
        self.lock().suggestion_requests.clone()
    }

    /// Whether [`Driver::stop`] ran.
    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Whether a server connection is held.
    pub fn is_linked(&self) -> bool {
        self.lock().link.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_server(&self) -> MutexGuard<'_, SimRoomServer> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn poll_input(&self, timeout: Option<Duration>) -> Result<Option<DriverInput>, SimDriverError> {
        let mut state = self.lock();
        if state.stopped {
            return Err(SimDriverError::Stopped);
        }

        loop {
            if let Some(event) = state.events.pop_front() {
                return Ok(Some(DriverInput::Client(event)));
            }

            if self.deliver_frames(&mut state) {
                continue;
            }

            match state.script.pop_front() {
                Some(ScriptStep::Input(input)) => return Ok(Some(input)),
                Some(ScriptStep::Wait(duration)) => match timeout {
                    Some(timeout) if timeout <= duration => {
                        self.env.advance(timeout);
                        if timeout < duration {
                            state.script.push_front(ScriptStep::Wait(duration - timeout));
                        }
                        return Ok(None);
                    },
                    _ => self.env.advance(duration),
                },
                Some(ScriptStep::DropConnection) => {
                    if let Some(link) = state.link.take() {
                        self.lock_server().disconnect(link.conn);
                        state.events.push_back(ClientEvent::TransportError {
                            attempt: link.attempt,
                            reason: "connection reset".to_string(),
                        });
                        state.events.push_back(ClientEvent::TransportClosed { attempt: link.attempt });
                    }
                },
                Some(ScriptStep::ServerOnline(online)) => self.lock_server().set_online(online),
                None => return Ok(Some(DriverInput::Quit)),
            }
        }
    }

    /// Move server frames for the live link into the event queue.
    ///
    /// Returns whether anything was queued.
    fn deliver_frames(&self, state: &mut SharedState) -> bool {
        let Some(link) = state.link else {
            return false;
        };

        let mut server = self.lock_server();
        let frames = server.drain(link.conn);
        let closed = server.is_closed_by_server(link.conn);
        let queued = !frames.is_empty() || closed;

        state.events.extend(
            frames
                .into_iter()
                .map(|payload| ClientEvent::FrameReceived { attempt: link.attempt, payload }),
        );
        if closed {
            server.disconnect(link.conn);
            state.link = None;
            state.events.push_back(ClientEvent::TransportClosed { attempt: link.attempt });
        }
        queued
    }
}

/// Room id is the last path segment of a room endpoint.
fn room_from_url(url: &str) -> Option<RoomId> {
    url.rsplit('/').next().and_then(|segment| RoomId::new(segment).ok())
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    fn next_input(
        &mut self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Option<DriverInput>, Self::Error>> + Send {
        std::future::ready(self.poll_input(timeout))
    }

    fn connect(&mut self, attempt: u64, url: &str) {
        let now = self.env.now();
        let mut state = self.lock();
        state.connects.push((now, attempt));

        let mut server = self.lock_server();
        if let Some(stale) = state.link.take() {
            server.disconnect(stale.conn);
        }

        match room_from_url(url).and_then(|room_id| server.connect(&room_id)) {
            Some(conn) => {
                state.link = Some(Link { attempt, conn });
                state.events.push_back(ClientEvent::TransportEstablished { attempt });
            },
            None => {
                state.events.push_back(ClientEvent::TransportError {
                    attempt,
                    reason: format!("connection refused: {url}"),
                });
                state.events.push_back(ClientEvent::TransportClosed { attempt });
            },
        }
    }

    fn transmit(&mut self, attempt: u64, payload: String) -> Result<(), Self::Error> {
        let mut state = self.lock();
        let link = state
            .link
            .filter(|link| link.attempt == attempt)
            .ok_or(SimDriverError::NotConnected { attempt })?;

        self.lock_server().receive(link.conn, &payload);
        state.transmitted.push(payload);
        Ok(())
    }

    fn disconnect(&mut self, attempt: u64) {
        let mut state = self.lock();
        if let Some(link) = state.link.filter(|link| link.attempt == attempt) {
            state.link = None;
            self.lock_server().disconnect(link.conn);
        }
    }

    fn request_suggestion(&mut self, request_id: u64, request: AutocompleteRequest) {
        let now = self.env.now();
        let response = self.suggester.respond(&request);

        let mut state = self.lock();
        state.suggestion_requests.push((now, request));
        state
            .events
            .push_back(ClientEvent::SuggestionCompleted { request_id, outcome: Ok(response) });
    }

    fn render(&mut self, sync: &SyncState) -> Result<(), Self::Error> {
        self.lock().renders.push(sync.clone());
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.lock();
        state.stopped = true;
        state.events.clear();
        if let Some(link) = state.link.take() {
            self.lock_server().disconnect(link.conn);
        }
    }
}
