//! Integration tests for session command and event-routing paths.
//!
//! These tests drive a [`Session`] against the simulation backend and verify
//! the optimistic-update reconciliation rules (what is mutated before a
//! backend call resolves, and what happens to that mutation on failure) plus
//! the per-event routing effects. The harness dev-depends on the session
//! crate, so everything harness-driven lives out here rather than in-source.

use std::time::Duration;

use palaver_harness::{BackendCall, CommandKind, SimBackend, SimEnv};
use palaver_proto::{
    BackendEvent, ChannelRecord, InboundMessage, MyInfo, OutboundMessage, PeerSeen, PeerTopic,
};
use palaver_session::{
    ChannelStage, DEFAULT_STATUS_CLEAR, Delivery, Environment, OWN_SENDER, PEER_CONNECTED_STATUS,
    PeerStatus, Session, SessionEffect, SessionError,
};

fn session() -> (Session<SimBackend, SimEnv>, SimBackend) {
    let backend = SimBackend::new();
    (Session::new(backend.clone(), SimEnv::with_seed(42)), backend)
}

/// Session whose clock the test controls.
fn session_with_env() -> (Session<SimBackend, SimEnv>, SimEnv) {
    let env = SimEnv::with_seed(42);
    (Session::new(SimBackend::new(), env.clone()), env)
}

fn outbound(text: &str) -> OutboundMessage {
    OutboundMessage {
        msg: text.to_string(),
        topic: "general".to_string(),
        peer_id: "self".to_string(),
        uuid: None,
    }
}

fn seen(peer_id: &str, address: &str) -> PeerSeen {
    PeerSeen { peer_id: peer_id.to_string(), address: address.to_string() }
}

fn inbound(uuid: &str) -> InboundMessage {
    InboundMessage {
        from: "p1".to_string(),
        content: "hello".to_string(),
        timestamp: "2025-01-01T00:00:00.000Z".to_string(),
        topic: "general".to_string(),
        uuid: uuid.to_string(),
    }
}

#[test]
fn identity_snapshot_replaces_wholesale() {
    let (mut session, _backend) = session();

    let first = MyInfo { peer_id: "me".to_string(), addresses: vec!["a1".to_string()] };
    let second =
        MyInfo { peer_id: "me".to_string(), addresses: vec!["a1".to_string(), "a2".to_string()] };

    let effects = session.apply(BackendEvent::MyAddress(first));
    assert_eq!(effects, vec![SessionEffect::Refresh]);

    let _ = session.apply(BackendEvent::MyInfoUpdate(second.clone()));
    assert_eq!(session.my_info(), Some(&second));
}

#[test]
fn peer_lifecycle_discover_connect_expire() {
    let (mut session, _backend) = session();

    let _ = session.apply(BackendEvent::PeerDiscovered(seen("p1", "addr1")));
    let _ = session.apply(BackendEvent::PeerConnected(seen("p1", "addr1")));

    let peer = session.peers().get("p1").cloned();
    assert_eq!(peer.map(|p| p.status), Some(PeerStatus::Connected));

    let effects = session.apply(BackendEvent::PeerExpired("p1".to_string()));
    assert_eq!(effects, vec![SessionEffect::Refresh]);
    assert!(session.peers().is_empty());
}

#[test]
fn replayed_discovery_changes_nothing() {
    let (mut session, _backend) = session();

    let _ = session.apply(BackendEvent::PeerDiscovered(seen("p1", "addr1")));
    let effects = session.apply(BackendEvent::PeerDiscovered(seen("p1", "addr1")));

    assert!(effects.is_empty(), "replay must not trigger a refresh");
    assert_eq!(session.peers().len(), 1);
}

#[test]
fn removal_of_unknown_peer_changes_nothing() {
    let (mut session, _backend) = session();

    let effects = session.apply(BackendEvent::PeerDisconnected("ghost".to_string()));

    assert!(effects.is_empty());
}

#[test]
fn peer_connected_sets_transient_status() {
    let (mut session, env) = session_with_env();

    let _ = session.apply(BackendEvent::PeerConnected(seen("p1", "addr1")));
    assert_eq!(session.status(), Some(PEER_CONNECTED_STATUS));

    env.advance(DEFAULT_STATUS_CLEAR);
    let effects = session.poll();

    assert_eq!(effects, vec![SessionEffect::Refresh]);
    assert_eq!(session.status(), None);
}

#[test]
fn duplicate_inbound_message_is_dropped() {
    let (mut session, _backend) = session();

    let first = session.apply(BackendEvent::MessageReceived(inbound("u1")));
    let second = session.apply(BackendEvent::MessageReceived(inbound("u1")));

    assert_eq!(first, vec![SessionEffect::Refresh]);
    assert!(second.is_empty());
    assert_eq!(session.log().len(), 1);
}

#[test]
fn connection_error_alerts_and_clears_status() {
    let (mut session, _backend) = session();
    session.set_status("Connecting...", None);

    let effects = session.apply(BackendEvent::ConnectionError("relay down".to_string()));

    assert_eq!(effects, vec![
        SessionEffect::Alert { message: "Connection error: relay down".to_string() },
        SessionEffect::Refresh,
    ]);
    assert_eq!(session.status(), None);
}

#[test]
fn connection_status_is_sticky() {
    let (mut session, env) = session_with_env();

    let _ = session.apply(BackendEvent::ConnectionStatus("Relay reachable".to_string()));

    env.advance(Duration::from_secs(600));
    assert!(session.poll().is_empty());
    assert_eq!(session.status(), Some("Relay reachable"));
}

#[test]
fn informational_events_produce_no_effects() {
    let (mut session, _backend) = session();

    let list = session.apply(BackendEvent::PeersList(vec!["p1".to_string()]));
    let sub = session.apply(BackendEvent::PeerSubscribed(PeerTopic {
        peer_id: "p1".to_string(),
        topic: "general".to_string(),
    }));

    assert!(list.is_empty());
    assert!(sub.is_empty());
    assert!(session.peers().is_empty(), "peers-list must not populate the registry");
}

#[test]
fn view_sorts_peers_by_id() {
    let (mut session, _backend) = session();

    let _ = session.apply(BackendEvent::PeerConnected(seen("p2", "addr2")));
    let _ = session.apply(BackendEvent::PeerConnected(seen("p1", "addr1")));

    let view = session.view();
    let ids: Vec<&str> = view.peers.iter().map(|peer| peer.peer_id.as_str()).collect();
    assert_eq!(ids, ["p1", "p2"]);
}

#[test]
fn teardown_drops_the_status() {
    let (mut session, _backend) = session();
    session.set_status("Connecting...", None);

    session.teardown();

    assert_eq!(session.status(), None);
}

#[tokio::test]
async fn load_channels_replaces_directory_and_resubscribes() {
    let (mut session, backend) = session();
    backend.set_channels(vec![
        ChannelRecord::new("general", "A"),
        ChannelRecord::new("dev", "B"),
    ]);

    session.load_channels().await.unwrap();

    let uuids: Vec<&str> =
        session.channels().channels().iter().map(|channel| channel.uuid.as_str()).collect();
    assert_eq!(uuids, ["A", "B"], "directory must mirror the persisted order");
    assert_eq!(
        backend.calls(),
        vec![
            BackendCall::GetChannels,
            BackendCall::AddTopic("A".to_string()),
            BackendCall::AddTopic("B".to_string()),
        ]
    );
}

#[tokio::test]
async fn load_failure_leaves_directory_untouched() {
    let (mut session, backend) = session();
    backend.fail_next(CommandKind::GetChannels, "store unavailable");

    let error = session.load_channels().await.unwrap_err();

    assert!(matches!(error, SessionError::Backend(_)));
    assert!(session.channels().is_empty());
}

#[tokio::test]
async fn failed_resubscribe_does_not_stop_the_rest() {
    let (mut session, backend) = session();
    backend.set_channels(vec![
        ChannelRecord::new("general", "A"),
        ChannelRecord::new("dev", "B"),
    ]);
    backend.fail_next(CommandKind::AddTopic, "relay busy");

    session.load_channels().await.unwrap();

    let subscribed: Vec<String> = backend
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            BackendCall::AddTopic(topic) => Some(topic),
            _ => None,
        })
        .collect();
    assert_eq!(subscribed, ["A", "B"], "the failed topic is attempted, the rest continue");
    assert_eq!(session.channels().len(), 2);
}

#[tokio::test]
async fn init_requests_identity_and_loads_channels() {
    let (mut session, backend) = session();
    backend.set_channels(vec![ChannelRecord::new("general", "A")]);

    session.init().await;

    assert_eq!(session.channels().len(), 1);
    let kinds: Vec<_> = backend.calls().iter().map(BackendCall::kind).collect();
    assert_eq!(kinds, [CommandKind::GetMyInfo, CommandKind::GetChannels, CommandKind::AddTopic]);
}

#[tokio::test]
async fn init_survives_backend_failures() {
    let (mut session, backend) = session();
    backend.fail_next(CommandKind::GetMyInfo, "not ready");
    backend.fail_next(CommandKind::GetChannels, "not ready");

    session.init().await;

    assert!(session.channels().is_empty());
    assert!(session.my_info().is_none());
}

#[tokio::test]
async fn create_channel_persists_then_subscribes() {
    let (mut session, backend) = session();

    let uuid = session.create_channel("general").await.unwrap();

    let channel = session.channels().get(&uuid).expect("channel should be in the directory");
    assert_eq!(channel.name, "general");
    assert_eq!(channel.stage, ChannelStage::Confirmed);
    assert_eq!(
        backend.calls(),
        vec![
            BackendCall::AddChannel(ChannelRecord::new("general", uuid.clone())),
            BackendCall::AddTopic(uuid),
        ],
        "persist must precede subscribe"
    );
}

#[tokio::test]
async fn create_channel_retracts_entry_when_persist_fails() {
    let (mut session, backend) = session();
    backend.fail_next(CommandKind::AddChannel, "disk full");

    let error = session.create_channel("general").await.unwrap_err();

    assert!(matches!(error, SessionError::Backend(_)));
    assert!(session.channels().is_empty(), "optimistic entry must be retracted");
    let kinds: Vec<_> = backend.calls().iter().map(BackendCall::kind).collect();
    assert_eq!(kinds, [CommandKind::AddChannel], "no subscribe after a failed persist");
}

#[tokio::test]
async fn create_channel_keeps_entry_when_subscribe_fails() {
    let (mut session, backend) = session();
    backend.fail_next(CommandKind::AddTopic, "relay busy");

    let error = session.create_channel("general").await.unwrap_err();

    assert!(matches!(error, SessionError::Backend(_)));
    assert_eq!(session.channels().len(), 1, "persisted entry stays despite failed subscribe");
    assert_eq!(session.channels().channels()[0].stage, ChannelStage::Confirmed);
}

#[tokio::test]
async fn create_channel_regenerates_a_colliding_uuid() {
    let (mut session, _backend) = session();
    // A same-seed environment previews the identifiers the session will mint.
    let preview = SimEnv::with_seed(42);
    let first = preview.new_uuid();
    let second = preview.new_uuid();
    session.join_channel("taken", first.clone()).await.unwrap();

    let created = session.create_channel("fresh").await.unwrap();

    assert_ne!(created, first, "a joined uuid must never be minted again");
    assert_eq!(created, second, "one regeneration resolves the collision");
    assert_eq!(session.channels().len(), 2);
    assert_eq!(session.channels().get(&first).unwrap().name, "taken");
    assert_eq!(session.channels().get(&created).unwrap().name, "fresh");
}

#[tokio::test]
async fn join_channel_rejects_duplicate_uuid() {
    let (mut session, backend) = session();
    session.join_channel("general", "A").await.unwrap();

    let error = session.join_channel("other name", "A").await.unwrap_err();

    assert!(matches!(error, SessionError::ChannelAlreadyJoined { uuid } if uuid == "A"));
    assert_eq!(session.channels().len(), 1);
    assert_eq!(session.channels().get("A").unwrap().name, "general");
    let persists =
        backend.calls().iter().filter(|call| call.kind() == CommandKind::AddChannel).count();
    assert_eq!(persists, 1, "a rejected join must not reach the backend");
}

#[tokio::test]
async fn send_message_echoes_before_the_relay_resolves() {
    let (mut session, backend) = session();
    backend.fail_next(CommandKind::SendMessage, "no route to topic");

    let error = session.send_message(outbound("hi")).await.unwrap_err();

    assert!(matches!(error, SessionError::Backend(_)));
    let log = session.log();
    assert_eq!(log.len(), 1, "the echo survives a failed relay");
    let echo = &log.messages()[0];
    assert!(echo.own);
    assert_eq!(echo.from, OWN_SENDER);
    assert_eq!(echo.content, "hi");
    assert_eq!(log.delivery(&echo.uuid), Some(Delivery::Failed));
}

#[tokio::test]
async fn send_message_confirms_and_backfills_the_uuid() {
    let (mut session, backend) = session();

    let uuid = session.send_message(outbound("hi")).await.unwrap();

    assert_eq!(session.log().delivery(&uuid), Some(Delivery::Confirmed));
    let relayed = match backend.calls().pop() {
        Some(BackendCall::SendMessage(payload)) => payload,
        other => panic!("expected a send_message call, got {other:?}"),
    };
    assert_eq!(
        relayed.uuid.as_deref(),
        Some(uuid.as_str()),
        "echo and relayed copy must share one dedup key"
    );
    assert_eq!(session.log().messages()[0].timestamp, "2025-01-01T00:00:00.000Z");
}

#[tokio::test]
async fn send_message_keeps_a_caller_supplied_uuid() {
    let (mut session, backend) = session();
    let mut payload = outbound("hi");
    payload.uuid = Some("chosen".to_string());

    let uuid = session.send_message(payload).await.unwrap();

    assert_eq!(uuid, "chosen");
    let relayed = match backend.calls().pop() {
        Some(BackendCall::SendMessage(payload)) => payload,
        other => panic!("expected a send_message call, got {other:?}"),
    };
    assert_eq!(relayed.uuid.as_deref(), Some("chosen"));
}

#[tokio::test]
async fn connect_rejects_empty_address_before_any_backend_call() {
    let (mut session, backend) = session();

    let error = session.connect_to_peer("").await.unwrap_err();

    assert!(matches!(error, SessionError::EmptyPeerAddress));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn connect_relays_the_address_verbatim() {
    let (mut session, backend) = session();

    session.connect_to_peer("/ip4/10.0.0.7/tcp/4001").await.unwrap();

    assert_eq!(
        backend.calls(),
        vec![BackendCall::ConnectToPeer("/ip4/10.0.0.7/tcp/4001".to_string())]
    );
}

#[tokio::test]
async fn query_commands_map_one_to_one() {
    let (mut session, backend) = session();

    session.refresh_peers().await.unwrap();
    session.request_my_info().await.unwrap();
    session.subscribe_topic("general").await.unwrap();

    assert_eq!(
        backend.calls(),
        vec![
            BackendCall::GetConnectedPeers,
            BackendCall::GetMyInfo,
            BackendCall::AddTopic("general".to_string()),
        ]
    );
}
