//! Test cluster simulation for convergence testing.
//!
//! Wires several room view clients to one [`SimRoomServer`] synchronously.
//! Transport actions are executed against the server model, server frames
//! are delivered back as events, and virtual time is stepped deadline by
//! deadline, so every run is deterministic.

use std::{collections::VecDeque, time::Duration};

use duet_client::{Client, ClientAction, ClientConfig, ClientEvent};
use duet_core::{Environment, SyncState};
use duet_proto::{AutocompleteRequest, AutocompleteResponse, Language, RoomId};

use crate::{
    sim_env::{SimEnv, SimInstant},
    sim_server::{ConnId, SimRoomServer},
    suggester::PatternSuggester,
};

/// Upper bound on timer firings within one [`TestCluster::advance`].
const MAX_STEPS_PER_ADVANCE: usize = 10_000;

/// What one peer asked its driver to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerStats {
    /// Connect actions, with the virtual time they were issued.
    pub connects: Vec<SimInstant>,
    /// Frames actually handed to the transport.
    pub transmits: usize,
    /// Disconnect actions.
    pub disconnects: usize,
    /// Suggestion requests, with the virtual time they were issued.
    pub suggestion_requests: Vec<(SimInstant, AutocompleteRequest)>,
    /// Re-render requests.
    pub renders: usize,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    attempt: u64,
    conn: ConnId,
}

struct Peer {
    client: Client<SimEnv>,
    link: Option<Link>,
    pending_suggestions: Vec<(u64, AutocompleteRequest)>,
    stats: PeerStats,
}

/// Simulated cluster of room views sharing one server and one clock.
pub struct TestCluster {
    env: SimEnv,
    server: SimRoomServer,
    suggester: PatternSuggester,
    config: ClientConfig,
    room_id: RoomId,
    peers: Vec<Peer>,
    queue: VecDeque<(usize, ClientEvent)>,
}

impl TestCluster {
    /// Cluster with one room of `language` and default client config.
    pub fn new(language: Language) -> Self {
        Self::with_config(language, ClientConfig::default())
    }

    /// Cluster with one room of `language`.
    pub fn with_config(language: Language, config: ClientConfig) -> Self {
        let mut server = SimRoomServer::new();
        let room_id = server.create_room(language).room_id;
        Self {
            env: SimEnv::new(),
            server,
            suggester: PatternSuggester::new(),
            config,
            room_id,
            peers: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    /// Room every default peer joins.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Current virtual time.
    pub fn now(&self) -> SimInstant {
        self.env.now()
    }

    /// Shared clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Server model.
    pub fn server(&self) -> &SimRoomServer {
        &self.server
    }

    /// Add a room view for the cluster's room. Not opened yet.
    pub fn add_peer(&mut self) -> usize {
        let room_id = self.room_id.clone();
        self.add_peer_for(room_id)
    }

    /// Add a room view for an arbitrary room id.
    pub fn add_peer_for(&mut self, room_id: RoomId) -> usize {
        let language = self.server.get_room(&room_id).map_or(Language::default(), |r| r.language);
        let client = Client::new(self.env.clone(), room_id, language, self.config.clone());
        self.peers.push(Peer {
            client,
            link: None,
            pending_suggestions: Vec::new(),
            stats: PeerStats::default(),
        });
        self.peers.len() - 1
    }

    /// Synchronization state of peer `i`.
    pub fn state(&self, i: usize) -> &SyncState {
        self.peers[i].client.state()
    }

    /// Client of peer `i`.
    pub fn client(&self, i: usize) -> &Client<SimEnv> {
        &self.peers[i].client
    }

    /// Driver-side record of peer `i`.
    pub fn stats(&self, i: usize) -> &PeerStats {
        &self.peers[i].stats
    }

    /// Whether peer `i` holds a server connection.
    pub fn is_linked(&self, i: usize) -> bool {
        self.peers[i].link.is_some()
    }

    /// Accept or refuse new connections.
    pub fn set_server_online(&mut self, online: bool) {
        self.server.set_online(online);
    }

    /// Feed an arbitrary event to peer `i` and run to quiescence.
    pub fn send_event(&mut self, i: usize, event: ClientEvent) {
        self.queue.push_back((i, event));
        self.pump();
    }

    /// Open peer `i`'s room view.
    pub fn open(&mut self, i: usize) {
        self.send_event(i, ClientEvent::Open);
    }

    /// Close peer `i`'s room view.
    pub fn close(&mut self, i: usize) {
        self.send_event(i, ClientEvent::Close);
    }

    /// Replace peer `i`'s buffer with `text`, cursor at the end.
    pub fn edit(&mut self, i: usize, text: &str) {
        let cursor = text.chars().count();
        self.send_event(i, ClientEvent::LocalEdit { buffer: text.to_string(), cursor });
    }

    /// Number of suggestion requests peer `i` has outstanding at the driver.
    pub fn pending_suggestions(&self, i: usize) -> usize {
        self.peers[i].pending_suggestions.len()
    }

    /// Answer every outstanding suggestion request of peer `i` with the
    /// pattern suggester, oldest first.
    pub fn resolve_suggestions(&mut self, i: usize) {
        let suggester = self.suggester;
        self.answer_suggestions(i, |request| suggester.respond(request));
    }

    /// Answer every outstanding suggestion request of peer `i` with
    /// `respond`, oldest first.
    pub fn answer_suggestions(
        &mut self,
        i: usize,
        respond: impl Fn(&AutocompleteRequest) -> AutocompleteResponse,
    ) {
        for (request_id, request) in std::mem::take(&mut self.peers[i].pending_suggestions) {
            let response = respond(&request);
            self.queue.push_back((
                i,
                ClientEvent::SuggestionCompleted { request_id, outcome: Ok(response) },
            ));
        }
        self.pump();
    }

    /// Fail every outstanding suggestion request of peer `i`.
    pub fn fail_suggestions(&mut self, i: usize, reason: &str) {
        for (request_id, _) in std::mem::take(&mut self.peers[i].pending_suggestions) {
            self.queue.push_back((
                i,
                ClientEvent::SuggestionCompleted { request_id, outcome: Err(reason.to_string()) },
            ));
        }
        self.pump();
    }

    /// Simulate a network drop of peer `i`'s connection.
    ///
    /// The server sees a disconnect; the client sees an error then a close.
    pub fn drop_connection(&mut self, i: usize) {
        if let Some(link) = self.peers[i].link.take() {
            self.server.disconnect(link.conn);
            self.queue.push_back((
                i,
                ClientEvent::TransportError {
                    attempt: link.attempt,
                    reason: "connection reset".to_string(),
                },
            ));
            self.queue.push_back((i, ClientEvent::TransportClosed { attempt: link.attempt }));
        }
        self.pump();
    }

    /// Advance virtual time by `duration`, firing every timer that falls due
    /// at its exact deadline.
    pub fn advance(&mut self, duration: Duration) {
        let target = self.env.now() + duration;

        for _ in 0..MAX_STEPS_PER_ADVANCE {
            let next = self.peers.iter().filter_map(|p| p.client.next_deadline()).min();
            match next {
                Some(deadline) if deadline <= target => {
                    self.env.advance_to(deadline);
                    self.tick_all();
                },
                _ => break,
            }
        }

        self.env.advance_to(target);
        self.tick_all();
    }

    fn tick_all(&mut self) {
        for i in 0..self.peers.len() {
            self.queue.push_back((i, ClientEvent::Tick));
        }
        self.pump();
    }

    /// Process queued events and deliver server frames until nothing moves.
    fn pump(&mut self) {
        loop {
            while let Some((i, event)) = self.queue.pop_front() {
                let actions = self.peers[i].client.handle(event);
                self.execute(i, actions);
            }

            self.deliver();
            if self.queue.is_empty() {
                break;
            }
        }
    }

    fn deliver(&mut self) {
        for (i, peer) in self.peers.iter_mut().enumerate() {
            let Some(link) = peer.link else {
                continue;
            };

            for payload in self.server.drain(link.conn) {
                self.queue.push_back((i, ClientEvent::FrameReceived { attempt: link.attempt, payload }));
            }

            if self.server.is_closed_by_server(link.conn) {
                self.server.disconnect(link.conn);
                peer.link = None;
                self.queue.push_back((i, ClientEvent::TransportClosed { attempt: link.attempt }));
            }
        }
    }

    fn execute(&mut self, i: usize, actions: Vec<ClientAction>) {
        let now = self.env.now();
        let peer = &mut self.peers[i];

        for action in actions {
            match action {
                ClientAction::Connect { attempt, .. } => {
                    peer.stats.connects.push(now);
                    match self.server.connect(peer.client.room_id()) {
                        Some(conn) => {
                            peer.link = Some(Link { attempt, conn });
                            self.queue.push_back((i, ClientEvent::TransportEstablished { attempt }));
                        },
                        None => {
                            self.queue.push_back((
                                i,
                                ClientEvent::TransportError {
                                    attempt,
                                    reason: "connection refused".to_string(),
                                },
                            ));
                            self.queue.push_back((i, ClientEvent::TransportClosed { attempt }));
                        },
                    }
                },
                ClientAction::Transmit { attempt, payload } => {
                    if let Some(link) = peer.link.filter(|l| l.attempt == attempt) {
                        peer.stats.transmits += 1;
                        self.server.receive(link.conn, &payload);
                    }
                },
                ClientAction::Disconnect { attempt } => {
                    peer.stats.disconnects += 1;
                    if let Some(link) = peer.link.filter(|l| l.attempt == attempt) {
                        self.server.disconnect(link.conn);
                        peer.link = None;
                    }
                },
                ClientAction::RequestSuggestion { request_id, request } => {
                    peer.stats.suggestion_requests.push((now, request.clone()));
                    peer.pending_suggestions.push((request_id, request));
                },
                ClientAction::StateChanged => peer.stats.renders += 1,
            }
        }
    }
}
