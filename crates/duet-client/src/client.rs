//! Room view state machine.
//!
//! The `Client` owns everything that lives for one open room view: the
//! synchronization state, the connection manager and the suggestion
//! coalescer. Events are processed one at a time, so no component ever
//! observes another mid-update.

use duet_core::{
    Coalescer, CoalescerConfig, ConnectionConfig, ConnectionManager, ConnectionPhase, Environment,
    SyncState,
};
use duet_proto::{Language, OutboundMessage, RoomId};

use crate::{
    dispatch,
    event::{ClientAction, ClientEvent},
};

/// Transport base used when none is configured.
pub const DEFAULT_WS_BASE: &str = "ws://localhost:8000";

/// Room view configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Transport base URL; the room endpoint is `<ws_base>/rooms/ws/<room_id>`
    pub ws_base: String,
    /// Reconnect policy
    pub connection: ConnectionConfig,
    /// Debounce and confidence policy
    pub coalescer: CoalescerConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_base: DEFAULT_WS_BASE.to_string(),
            connection: ConnectionConfig::default(),
            coalescer: CoalescerConfig::default(),
        }
    }
}

/// Room endpoint for `room_id` under `ws_base`.
pub fn room_endpoint(ws_base: &str, room_id: &RoomId) -> String {
    format!("{}/rooms/ws/{}", ws_base.trim_end_matches('/'), room_id)
}

/// One open room view.
pub struct Client<E: Environment> {
    env: E,
    state: SyncState,
    connection: ConnectionManager<E::Instant>,
    coalescer: Coalescer<E::Instant>,
    /// Set by `Close`, cleared by `Open`. Local input is ignored while set.
    closed: bool,
}

impl<E: Environment> Client<E> {
    /// Create a room view. Nothing is connected until [`ClientEvent::Open`].
    pub fn new(env: E, room_id: RoomId, language: Language, config: ClientConfig) -> Self {
        let url = room_endpoint(&config.ws_base, &room_id);
        Self {
            env,
            state: SyncState::new(room_id, language),
            connection: ConnectionManager::new(url, config.connection),
            coalescer: Coalescer::new(config.coalescer),
            closed: false,
        }
    }

    /// Current synchronization state.
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Room this view belongs to.
    pub fn room_id(&self) -> &RoomId {
        self.state.room_id()
    }

    /// Connection lifecycle phase.
    pub fn connection_phase(&self) -> ConnectionPhase {
        self.connection.phase()
    }

    /// Whether the view has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether any timer is armed.
    pub fn has_pending_timers(&self) -> bool {
        self.connection.reconnect_pending() || self.coalescer.is_scheduled()
    }

    /// Earliest time a [`ClientEvent::Tick`] has work to do.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        match (self.connection.next_deadline(), self.coalescer.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Process one event.
    pub fn handle(&mut self, event: ClientEvent) -> Vec<ClientAction> {
        match event {
            ClientEvent::Open => self.handle_open(),
            ClientEvent::Close => self.handle_close(),
            ClientEvent::TransportEstablished { attempt } => {
                changed(self.connection.handle_established(&mut self.state, attempt))
            },
            ClientEvent::FrameReceived { attempt, payload } => {
                match self.connection.handle_payload(attempt, &payload) {
                    Some(message) => changed(dispatch::apply(&mut self.state, &message)),
                    None => Vec::new(),
                }
            },
            ClientEvent::TransportError { attempt, reason } => {
                self.connection.handle_error(attempt, &reason);
                Vec::new()
            },
            ClientEvent::TransportClosed { attempt } => {
                let now = self.env.now();
                let mut actions: Vec<ClientAction> = self
                    .connection
                    .handle_closed(&mut self.state, attempt, now)
                    .into_iter()
                    .map(ClientAction::from)
                    .collect();
                if !actions.is_empty() {
                    actions.push(ClientAction::StateChanged);
                }
                actions
            },
            ClientEvent::LocalEdit { buffer, cursor } => self.handle_local_edit(buffer, cursor),
            ClientEvent::CursorMoved { cursor } => {
                self.state.set_cursor_position(cursor);
                vec![ClientAction::StateChanged]
            },
            ClientEvent::SelectLanguage { language } => {
                self.state.set_language(language);
                vec![ClientAction::StateChanged]
            },
            ClientEvent::DismissSuggestion => {
                let had = self.state.pending_suggestion().is_some();
                self.state.clear_suggestion();
                changed(had)
            },
            ClientEvent::SuggestionCompleted { request_id, outcome } => {
                let loading = self.state.suggestion_loading();
                let offered = self.coalescer.complete(&mut self.state, request_id, outcome);
                changed(offered || loading != self.state.suggestion_loading())
            },
            ClientEvent::Tick => self.handle_tick(),
        }
    }

    fn handle_open(&mut self) -> Vec<ClientAction> {
        self.closed = false;
        self.connection.open().into_iter().map(ClientAction::from).collect()
    }

    fn handle_close(&mut self) -> Vec<ClientAction> {
        self.closed = true;
        self.coalescer.reset(&mut self.state);

        let mut actions: Vec<ClientAction> =
            self.connection.close(&mut self.state).into_iter().map(ClientAction::from).collect();
        actions.push(ClientAction::StateChanged);
        actions
    }

    fn handle_local_edit(&mut self, buffer: String, cursor: usize) -> Vec<ClientAction> {
        if self.closed {
            tracing::debug!(room_id = %self.state.room_id(), "ignoring edit on closed room view");
            return Vec::new();
        }

        let now = self.env.now();
        self.state.apply_local_edit(buffer, cursor);
        self.coalescer.on_local_edit(&mut self.state, now);

        let update = OutboundMessage::code_update(self.state.buffer(), self.env.wall_clock_millis());
        let mut actions = match self.connection.send(&update) {
            Ok(actions) => actions.into_iter().map(ClientAction::from).collect(),
            Err(error) => {
                tracing::warn!(
                    room_id = %self.state.room_id(),
                    %error,
                    transient = error.is_transient(),
                    "local update not sent"
                );
                Vec::new()
            },
        };
        actions.push(ClientAction::StateChanged);
        actions
    }

    fn handle_tick(&mut self) -> Vec<ClientAction> {
        let now = self.env.now();
        let mut actions: Vec<ClientAction> =
            self.connection.tick(now).into_iter().map(ClientAction::from).collect();

        if let Some(request) = self.coalescer.tick(&mut self.state, now) {
            actions.push(ClientAction::RequestSuggestion {
                request_id: request.id,
                request: request.request,
            });
            actions.push(ClientAction::StateChanged);
        }
        actions
    }
}

fn changed(flag: bool) -> Vec<ClientAction> {
    if flag { vec![ClientAction::StateChanged] } else { Vec::new() }
}
