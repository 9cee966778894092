//! In-memory model of the collaboration server.
//!
//! Reproduces the server's room reconciliation so client behavior can be
//! tested end to end without sockets:
//!
//! - a joiner receives `init` with the stored code and the new count
//! - everyone else in the room receives `user_joined`
//! - a `code_update` is stored and forwarded to every member but the sender
//! - a leave sends `user_left` to the remaining members
//! - connecting to an unknown room yields `error` and a server-side close
//!
//! Frames destined for a connection queue in its outbox until drained.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use duet_proto::{InboundMessage, Language, OutboundMessage, RoomId, RoomInfo};

/// Server-side connection identifier.
pub type ConnId = u64;

/// Message sent when a client connects to a room that does not exist.
pub const ROOM_NOT_FOUND: &str = "Room not found";

/// Server model shared between drivers in one simulation.
pub type SharedRoomServer = Arc<Mutex<SimRoomServer>>;

/// Create a server model wrapped for sharing.
pub fn create_shared_server() -> SharedRoomServer {
    Arc::new(Mutex::new(SimRoomServer::new()))
}

#[derive(Debug)]
struct Room {
    code: String,
    language: Language,
    created_at: String,
    members: BTreeSet<ConnId>,
}

#[derive(Debug)]
struct Connection {
    room_id: RoomId,
    outbox: VecDeque<String>,
    /// Server closed this connection; nothing more will be delivered.
    closed_by_server: bool,
}

/// In-memory collaboration server.
#[derive(Debug, Default)]
pub struct SimRoomServer {
    rooms: BTreeMap<RoomId, Room>,
    connections: HashMap<ConnId, Connection>,
    next_room: u64,
    next_conn: ConnId,
    online: bool,
}

impl SimRoomServer {
    /// Empty, online server.
    pub fn new() -> Self {
        Self { online: true, ..Self::default() }
    }

    /// Whether new connections are accepted.
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Accept or refuse new connections. Existing ones are unaffected.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Create a room, as `POST /rooms` does.
    pub fn create_room(&mut self, language: Language) -> RoomInfo {
        self.next_room += 1;
        let created_at = format!("sim-{}", self.next_room);
        let room_id = match RoomId::new(format!("room-{}", self.next_room)) {
            Ok(id) => id,
            Err(error) => unreachable!("generated room id is valid: {error}"),
        };

        self.rooms.insert(
            room_id.clone(),
            Room {
                code: String::new(),
                language,
                created_at: created_at.clone(),
                members: BTreeSet::new(),
            },
        );
        tracing::debug!(%room_id, %language, "sim room created");

        RoomInfo { room_id, code_content: String::new(), language, created_at: Some(created_at) }
    }

    /// Look up a room, as `GET /rooms/<id>` does.
    pub fn get_room(&self, room_id: &RoomId) -> Option<RoomInfo> {
        self.rooms.get(room_id).map(|room| RoomInfo {
            room_id: room_id.clone(),
            code_content: room.code.clone(),
            language: room.language,
            created_at: Some(room.created_at.clone()),
        })
    }

    /// Stored code of a room.
    pub fn room_code(&self, room_id: &RoomId) -> Option<&str> {
        self.rooms.get(room_id).map(|room| room.code.as_str())
    }

    /// Live connections in a room.
    pub fn participant_count(&self, room_id: &RoomId) -> u32 {
        self.rooms.get(room_id).map_or(0, |room| room.members.len() as u32)
    }

    /// Accept a WebSocket connection for `room_id`.
    ///
    /// Returns `None` if the server is offline (connection refused).
    pub fn connect(&mut self, room_id: &RoomId) -> Option<ConnId> {
        if !self.online {
            return None;
        }

        self.next_conn += 1;
        let conn = self.next_conn;
        let mut connection =
            Connection { room_id: room_id.clone(), outbox: VecDeque::new(), closed_by_server: false };

        let Some(room) = self.rooms.get_mut(room_id) else {
            push(&mut connection.outbox, &InboundMessage::Error { message: ROOM_NOT_FOUND.into() });
            connection.closed_by_server = true;
            self.connections.insert(conn, connection);
            return Some(conn);
        };

        room.members.insert(conn);
        let users_count = room.members.len() as u32;
        push(
            &mut connection.outbox,
            &InboundMessage::Init {
                code: room.code.clone(),
                users_count,
                language: Some(room.language),
            },
        );
        let others: Vec<ConnId> = room.members.iter().copied().filter(|m| *m != conn).collect();
        self.connections.insert(conn, connection);
        self.send_to(&others, &InboundMessage::UserJoined { users_count });

        Some(conn)
    }

    /// Handle a text frame from `conn`.
    ///
    /// Unparseable frames are dropped, as are frames on closed connections.
    pub fn receive(&mut self, conn: ConnId, payload: &str) {
        let Some(connection) = self.connections.get(&conn) else {
            return;
        };
        if connection.closed_by_server {
            return;
        }
        let room_id = connection.room_id.clone();

        let OutboundMessage::CodeUpdate { code, timestamp } = match OutboundMessage::decode(payload) {
            Ok(message) => message,
            Err(error) => {
                tracing::debug!(conn, %error, "sim server dropping frame");
                return;
            },
        };

        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };
        room.code.clone_from(&code);
        let others: Vec<ConnId> = room.members.iter().copied().filter(|m| *m != conn).collect();
        self.send_to(&others, &InboundMessage::CodeUpdate { code, timestamp: Some(timestamp) });
    }

    /// Connection `conn` went away (client close or network drop).
    pub fn disconnect(&mut self, conn: ConnId) {
        let Some(connection) = self.connections.remove(&conn) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&connection.room_id) else {
            return;
        };
        if !room.members.remove(&conn) {
            return;
        }

        let users_count = room.members.len() as u32;
        let remaining: Vec<ConnId> = room.members.iter().copied().collect();
        self.send_to(&remaining, &InboundMessage::UserLeft { users_count });
    }

    /// Take every frame queued for `conn`.
    pub fn drain(&mut self, conn: ConnId) -> Vec<String> {
        self.connections
            .get_mut(&conn)
            .map(|connection| connection.outbox.drain(..).collect())
            .unwrap_or_default()
    }

    /// Whether the server has closed `conn` (after an `error`).
    pub fn is_closed_by_server(&self, conn: ConnId) -> bool {
        self.connections.get(&conn).is_some_and(|connection| connection.closed_by_server)
    }

    fn send_to(&mut self, conns: &[ConnId], message: &InboundMessage) {
        for conn in conns {
            if let Some(connection) = self.connections.get_mut(conn) {
                push(&mut connection.outbox, message);
            }
        }
    }
}

fn push(outbox: &mut VecDeque<String>, message: &InboundMessage) {
    match message.encode() {
        Ok(frame) => outbox.push_back(frame),
        Err(error) => tracing::error!(%error, kind = message.kind(), "sim server failed to encode"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(frames: Vec<String>) -> Vec<InboundMessage> {
        frames.iter().map(|f| InboundMessage::decode(f).unwrap()).collect()
    }

    #[test]
    fn join_sends_init_and_presence() {
        let mut server = SimRoomServer::new();
        let room = server.create_room(Language::Python).room_id;

        let a = server.connect(&room).unwrap();
        assert_eq!(
            decode_all(server.drain(a)),
            vec![InboundMessage::Init {
                code: String::new(),
                users_count: 1,
                language: Some(Language::Python)
            }]
        );

        let b = server.connect(&room).unwrap();
        assert_eq!(decode_all(server.drain(a)), vec![InboundMessage::UserJoined { users_count: 2 }]);
        assert!(matches!(
            decode_all(server.drain(b)).as_slice(),
            [InboundMessage::Init { users_count: 2, .. }]
        ));
    }

    #[test]
    fn code_update_forwarded_to_others_only() {
        let mut server = SimRoomServer::new();
        let room = server.create_room(Language::Python).room_id;
        let a = server.connect(&room).unwrap();
        let b = server.connect(&room).unwrap();
        server.drain(a);
        server.drain(b);

        server.receive(a, &OutboundMessage::code_update("x = 1", 9).encode().unwrap());

        assert!(server.drain(a).is_empty());
        assert_eq!(
            decode_all(server.drain(b)),
            vec![InboundMessage::CodeUpdate { code: "x = 1".into(), timestamp: Some(9) }]
        );
        assert_eq!(server.room_code(&room), Some("x = 1"));

        // Late joiners get the stored code.
        let c = server.connect(&room).unwrap();
        assert!(matches!(
            decode_all(server.drain(c)).as_slice(),
            [InboundMessage::Init { code, users_count: 3, .. }] if code == "x = 1"
        ));
    }

    #[test]
    fn leave_notifies_remaining() {
        let mut server = SimRoomServer::new();
        let room = server.create_room(Language::Javascript).room_id;
        let a = server.connect(&room).unwrap();
        let b = server.connect(&room).unwrap();
        server.drain(a);

        server.disconnect(b);
        server.disconnect(b);

        assert_eq!(decode_all(server.drain(a)), vec![InboundMessage::UserLeft { users_count: 1 }]);
        assert_eq!(server.participant_count(&room), 1);
    }

    #[test]
    fn unknown_room_errors_and_closes() {
        let mut server = SimRoomServer::new();
        let conn = server.connect(&RoomId::new("nope").unwrap()).unwrap();

        assert_eq!(
            decode_all(server.drain(conn)),
            vec![InboundMessage::Error { message: ROOM_NOT_FOUND.into() }]
        );
        assert!(server.is_closed_by_server(conn));
    }

    #[test]
    fn offline_refuses_connections() {
        let mut server = SimRoomServer::new();
        let room = server.create_room(Language::Python).room_id;
        server.set_online(false);
        assert!(server.connect(&room).is_none());
        server.set_online(true);
        assert!(server.connect(&room).is_some());
    }

    #[test]
    fn garbage_frames_are_dropped() {
        let mut server = SimRoomServer::new();
        let room = server.create_room(Language::Python).room_id;
        let a = server.connect(&room).unwrap();
        let b = server.connect(&room).unwrap();
        server.drain(b);

        server.receive(a, "not json");
        server.receive(a, r#"{"type":"cursor_position","position":3}"#);

        assert!(server.drain(b).is_empty());
        assert_eq!(server.room_code(&room), Some(""));
    }
}
