//! Synchronization behavior of room views against the in-memory server.
//!
//! Every timing property runs on virtual time, so deadlines are asserted to
//! the millisecond.

use std::time::Duration;

use duet_client::{ClientConfig, ClientEvent};
use duet_core::ConnectionStatus;
use duet_harness::{SimInstant, TestCluster};
use duet_proto::{AutocompleteResponse, InboundMessage, Language, RoomId};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn at(n: u64) -> SimInstant {
    SimInstant::from_millis(n)
}

fn confidence(value: f64) -> impl Fn(&duet_proto::AutocompleteRequest) -> AutocompleteResponse {
    move |_| AutocompleteResponse { suggestion: "pass".into(), confidence: value }
}

/// Cluster with `n` peers, all opened and connected.
fn connected_cluster(n: usize) -> TestCluster {
    let mut cluster = TestCluster::new(Language::Python);
    for _ in 0..n {
        let peer = cluster.add_peer();
        cluster.open(peer);
    }
    cluster
}

#[test]
fn peers_converge_on_last_writer() {
    let mut cluster = connected_cluster(2);
    assert_eq!(cluster.state(0).participant_count(), 2);
    assert_eq!(cluster.state(1).participant_count(), 2);

    cluster.edit(0, "x = 1");
    assert_eq!(cluster.state(1).buffer(), "x = 1");

    cluster.edit(1, "y = 2");
    cluster.edit(0, "z = 3");

    for peer in 0..2 {
        assert_eq!(cluster.state(peer).buffer(), "z = 3");
    }
    assert_eq!(cluster.server().room_code(cluster.room_id()), Some("z = 3"));
}

#[test]
fn late_joiner_receives_stored_buffer() {
    let mut cluster = connected_cluster(1);
    cluster.edit(0, "print('hi')");

    let late = cluster.add_peer();
    cluster.open(late);

    assert_eq!(cluster.state(late).buffer(), "print('hi')");
    assert_eq!(cluster.state(late).participant_count(), 2);
    assert_eq!(cluster.state(0).participant_count(), 2);
}

#[test]
fn leaving_peer_updates_count() {
    let mut cluster = connected_cluster(3);
    cluster.close(2);

    assert_eq!(cluster.state(0).participant_count(), 2);
    assert_eq!(cluster.state(1).participant_count(), 2);
    assert_eq!(cluster.server().participant_count(cluster.room_id()), 2);
}

#[test]
fn repeated_init_changes_nothing() {
    let mut cluster = connected_cluster(1);
    let init = InboundMessage::Init {
        code: "a = 1\n".into(),
        users_count: 4,
        language: Some(Language::Python),
    }
    .encode()
    .unwrap();

    cluster.send_event(0, ClientEvent::FrameReceived { attempt: 1, payload: init.clone() });
    let after_first = cluster.state(0).clone();
    cluster.send_event(0, ClientEvent::FrameReceived { attempt: 1, payload: init });

    assert_eq!(cluster.state(0), &after_first);
    assert_eq!(after_first.buffer(), "a = 1\n");
    assert_eq!(after_first.participant_count(), 4);
}

#[test]
fn edit_burst_fires_one_request_after_quiet_period() {
    let mut cluster = connected_cluster(1);

    cluster.edit(0, "d");
    cluster.advance(ms(100));
    cluster.edit(0, "de");
    cluster.advance(ms(100));
    cluster.edit(0, "def ");
    cluster.advance(ms(2_000));

    let requests = &cluster.stats(0).suggestion_requests;
    assert_eq!(requests.len(), 1);
    let (fired_at, request) = &requests[0];
    assert_eq!(*fired_at, at(800));
    assert_eq!(request.code, "def ");
    assert_eq!(request.cursor_position, 4);
    assert_eq!(request.language, Language::Python);
}

#[test]
fn confidence_must_exceed_threshold() {
    let mut cluster = connected_cluster(1);

    cluster.edit(0, "x");
    cluster.advance(ms(600));
    cluster.answer_suggestions(0, confidence(0.4));
    assert_eq!(cluster.state(0).pending_suggestion(), None);
    assert!(!cluster.state(0).suggestion_loading());

    cluster.edit(0, "xy");
    cluster.advance(ms(600));
    cluster.answer_suggestions(0, confidence(0.5));
    assert_eq!(cluster.state(0).pending_suggestion(), None);

    cluster.edit(0, "xyz");
    cluster.advance(ms(600));
    cluster.answer_suggestions(0, confidence(0.6));
    assert_eq!(cluster.state(0).pending_suggestion(), Some("pass"));
}

#[test]
fn local_edit_clears_suggestion_immediately() {
    let mut cluster = connected_cluster(1);
    cluster.edit(0, "def ");
    cluster.advance(ms(600));
    cluster.resolve_suggestions(0);
    assert_eq!(cluster.state(0).pending_suggestion(), Some("def function_name():\n    pass"));

    cluster.edit(0, "def f");

    assert_eq!(cluster.state(0).pending_suggestion(), None);
    assert_eq!(cluster.stats(0).suggestion_requests.len(), 1);
}

#[test]
fn stale_response_is_discarded() {
    let mut cluster = connected_cluster(1);
    cluster.edit(0, "def ");
    cluster.advance(ms(600));
    assert_eq!(cluster.pending_suggestions(0), 1);

    // A newer edit supersedes the request still in flight.
    cluster.edit(0, "def f");
    cluster.resolve_suggestions(0);

    assert_eq!(cluster.state(0).pending_suggestion(), None);
    assert!(!cluster.state(0).suggestion_loading());
}

#[test]
fn loading_stays_set_while_any_request_is_outstanding() {
    let mut cluster = connected_cluster(1);
    cluster.edit(0, "x");
    cluster.advance(ms(600));
    cluster.edit(0, "xy");
    cluster.advance(ms(600));
    assert_eq!(cluster.pending_suggestions(0), 2);
    assert!(cluster.state(0).suggestion_loading());

    cluster.fail_suggestions(0, "service unavailable");

    assert!(!cluster.state(0).suggestion_loading());
    assert_eq!(cluster.state(0).pending_suggestion(), None);
}

#[test]
fn remote_update_keeps_suggestion_and_clamps_cursor() {
    let mut cluster = connected_cluster(2);
    cluster.edit(0, "def ");
    cluster.advance(ms(600));
    cluster.resolve_suggestions(0);
    assert!(cluster.state(0).pending_suggestion().is_some());

    cluster.edit(1, "x");

    assert_eq!(cluster.state(0).buffer(), "x");
    assert_eq!(cluster.state(0).cursor(), 1);
    assert!(cluster.state(0).pending_suggestion().is_some());
}

#[test]
fn selected_language_applies_to_next_request() {
    let mut cluster = connected_cluster(1);
    cluster.send_event(0, ClientEvent::SelectLanguage { language: Language::Javascript });
    cluster.edit(0, "const ");
    cluster.advance(ms(600));
    cluster.resolve_suggestions(0);

    assert_eq!(cluster.stats(0).suggestion_requests[0].1.language, Language::Javascript);
    assert_eq!(cluster.state(0).pending_suggestion(), Some("const name = value;"));
}

#[test]
fn cursor_move_sends_nothing_and_keeps_schedule() {
    let mut cluster = connected_cluster(2);
    cluster.edit(0, "hello");
    let transmits = cluster.stats(0).transmits;

    cluster.advance(ms(500));
    cluster.send_event(0, ClientEvent::CursorMoved { cursor: 2 });
    cluster.advance(ms(100));

    assert_eq!(cluster.stats(0).transmits, transmits);
    let (fired_at, request) = &cluster.stats(0).suggestion_requests[0];
    assert_eq!(*fired_at, at(600));
    assert_eq!(request.cursor_position, 2);
    assert_eq!(cluster.state(1).buffer(), "hello");
}

#[test]
fn close_triggers_exactly_one_reconnect_each_time() {
    let mut cluster = connected_cluster(1);
    assert_eq!(cluster.stats(0).connects, vec![at(0)]);

    cluster.drop_connection(0);
    assert_eq!(cluster.state(0).connection_status(), ConnectionStatus::Disconnected);
    cluster.advance(ms(2_999));
    assert_eq!(cluster.stats(0).connects.len(), 1);
    cluster.advance(ms(1));
    assert_eq!(cluster.stats(0).connects, vec![at(0), at(3_000)]);
    assert!(cluster.state(0).is_connected());

    cluster.advance(ms(1_000));
    cluster.drop_connection(0);
    // A duplicate close for the dead attempt schedules nothing more.
    cluster.send_event(0, ClientEvent::TransportClosed { attempt: 2 });
    cluster.advance(ms(10_000));

    assert_eq!(cluster.stats(0).connects, vec![at(0), at(3_000), at(7_000)]);
}

#[test]
fn refused_reconnects_retry_at_fixed_interval() {
    let mut cluster = connected_cluster(1);
    cluster.set_server_online(false);
    cluster.drop_connection(0);

    cluster.advance(ms(9_000));
    assert_eq!(cluster.stats(0).connects, vec![at(0), at(3_000), at(6_000), at(9_000)]);
    assert!(!cluster.state(0).is_connected());

    cluster.set_server_online(true);
    cluster.advance(ms(3_000));
    assert_eq!(cluster.stats(0).connects.len(), 5);
    assert!(cluster.state(0).is_connected());
}

#[test]
fn unknown_room_keeps_retrying() {
    let mut cluster = TestCluster::new(Language::Python);
    let peer = cluster.add_peer_for(RoomId::new("missing").unwrap());
    cluster.open(peer);

    assert!(!cluster.state(peer).is_connected());
    assert!(!cluster.is_linked(peer));
    assert!(cluster.client(peer).has_pending_timers());

    cluster.advance(ms(3_000));
    assert_eq!(cluster.stats(peer).connects, vec![at(0), at(3_000)]);
}

#[test]
fn closed_view_leaks_nothing() {
    let mut cluster = connected_cluster(2);
    cluster.edit(0, "x");
    cluster.drop_connection(1);

    cluster.close(0);
    cluster.close(1);

    for peer in 0..2 {
        assert!(!cluster.client(peer).has_pending_timers());
        assert_eq!(cluster.client(peer).next_deadline(), None);
        assert!(!cluster.is_linked(peer));
    }
    assert_eq!(cluster.server().participant_count(cluster.room_id()), 0);

    let renders = cluster.stats(0).renders;
    cluster.advance(ms(60_000));
    assert_eq!(cluster.stats(0).connects.len(), 1);
    assert_eq!(cluster.stats(1).connects.len(), 1);
    assert!(cluster.stats(0).suggestion_requests.is_empty());
    assert_eq!(cluster.stats(0).renders, renders);
}

#[test]
fn send_while_disconnected_is_dropped() {
    let mut cluster = TestCluster::new(Language::Python);
    let peer = cluster.add_peer();
    cluster.set_server_online(false);
    cluster.open(peer);

    cluster.edit(peer, "abc");

    assert_eq!(cluster.state(peer).buffer(), "abc");
    assert_eq!(cluster.state(peer).connection_status(), ConnectionStatus::Disconnected);
    assert_eq!(cluster.stats(peer).transmits, 0);
    assert_eq!(cluster.server().room_code(cluster.room_id()), Some(""));

    // No replay after reconnecting: the server's buffer wins.
    cluster.set_server_online(true);
    cluster.advance(ms(3_000));
    assert!(cluster.state(peer).is_connected());
    assert_eq!(cluster.state(peer).buffer(), "");
}

#[test]
fn custom_timings_are_honored() {
    let mut config = ClientConfig::default();
    config.connection.reconnect_delay = ms(500);
    config.coalescer.quiet_period = ms(250);
    let mut cluster = TestCluster::with_config(Language::Python, config);
    let peer = cluster.add_peer();
    cluster.open(peer);

    cluster.edit(peer, "x");
    cluster.drop_connection(peer);
    cluster.advance(ms(1_000));

    assert_eq!(cluster.stats(peer).suggestion_requests[0].0, at(250));
    assert_eq!(cluster.stats(peer).connects, vec![at(0), at(500)]);
}
