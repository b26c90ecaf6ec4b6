//! Property-based tests for the session's state stores.
//!
//! Events arrive at least once and in bursts, so the interesting properties
//! hold over arbitrary interleavings: registry membership matches a naive
//! model, the log keeps the first occurrence per uuid, and status expiry is
//! governed solely by the most recent set.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use palaver_harness::{SimBackend, SimEnv};
use palaver_proto::{BackendEvent, InboundMessage, PeerSeen};
use palaver_session::{ChannelDirectory, Environment, Session, StatusNotifier};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum PeerOp {
    Discover(usize, usize),
    Connect(usize, usize),
    Disconnect(usize),
    Expire(usize),
}

fn peer_ops() -> impl Strategy<Value = Vec<PeerOp>> {
    prop::collection::vec(
        prop_oneof![
            (0..5usize, 0..3usize).prop_map(|(id, addr)| PeerOp::Discover(id, addr)),
            (0..5usize, 0..3usize).prop_map(|(id, addr)| PeerOp::Connect(id, addr)),
            (0..5usize).prop_map(PeerOp::Disconnect),
            (0..5usize).prop_map(PeerOp::Expire),
        ],
        0..40,
    )
}

fn seen(id: usize, addr: usize) -> PeerSeen {
    PeerSeen { peer_id: format!("p{id}"), address: format!("addr{addr}") }
}

/// Property: for any event interleaving, registry membership equals a naive
/// insert/remove model and holds at most one entry per peer id.
#[test]
fn prop_registry_membership_matches_model() {
    proptest!(|(ops in peer_ops())| {
        let mut session = Session::new(SimBackend::new(), SimEnv::with_seed(0));
        let mut model: HashSet<String> = HashSet::new();

        for op in ops {
            match op {
                PeerOp::Discover(id, addr) => {
                    let _ = session.apply(BackendEvent::PeerDiscovered(seen(id, addr)));
                    model.insert(format!("p{id}"));
                },
                PeerOp::Connect(id, addr) => {
                    let _ = session.apply(BackendEvent::PeerConnected(seen(id, addr)));
                    model.insert(format!("p{id}"));
                },
                PeerOp::Disconnect(id) => {
                    let _ = session.apply(BackendEvent::PeerDisconnected(format!("p{id}")));
                    model.remove(&format!("p{id}"));
                },
                PeerOp::Expire(id) => {
                    let _ = session.apply(BackendEvent::PeerExpired(format!("p{id}")));
                    model.remove(&format!("p{id}"));
                },
            }
        }

        let ids: Vec<String> =
            session.view().peers.iter().map(|peer| peer.peer_id.clone()).collect();
        let mut expected: Vec<String> = model.into_iter().collect();
        expected.sort();

        prop_assert_eq!(ids, expected);
    });
}

/// Property: for any inbound stream, the log stores the first occurrence per
/// uuid and nothing else, in arrival order.
#[test]
fn prop_log_keeps_first_occurrence_per_uuid() {
    proptest!(|(stream in prop::collection::vec(
        (0..8usize, 0..3usize, "[a-z]{0,8}"),
        0..40,
    ))| {
        let mut session = Session::new(SimBackend::new(), SimEnv::with_seed(0));
        let mut first: HashMap<String, String> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for (uuid_idx, topic_idx, content) in stream {
            let uuid = format!("u{uuid_idx}");
            let _ = session.apply(BackendEvent::MessageReceived(InboundMessage {
                from: "p1".to_string(),
                content: content.clone(),
                timestamp: "2025-01-01T00:00:00.000Z".to_string(),
                topic: format!("t{topic_idx}"),
                uuid: uuid.clone(),
            }));
            if !first.contains_key(&uuid) {
                first.insert(uuid.clone(), content);
                order.push(uuid);
            }
        }

        let log = session.log();
        prop_assert_eq!(log.len(), order.len());
        for (message, uuid) in log.messages().iter().zip(&order) {
            prop_assert_eq!(&message.uuid, uuid);
            prop_assert_eq!(Some(&message.content), first.get(uuid));
        }
    });
}

/// Property: the per-topic projection is an order-preserving filter of the
/// flat log.
#[test]
fn prop_topic_projection_preserves_arrival_order() {
    proptest!(|(topics in prop::collection::vec(0..3usize, 0..40))| {
        let mut session = Session::new(SimBackend::new(), SimEnv::with_seed(0));
        let mut expected: HashMap<String, Vec<String>> = HashMap::new();

        for (index, topic_idx) in topics.into_iter().enumerate() {
            let topic = format!("t{topic_idx}");
            let uuid = format!("u{index}");
            let _ = session.apply(BackendEvent::MessageReceived(InboundMessage {
                from: "p1".to_string(),
                content: format!("m{index}"),
                timestamp: "2025-01-01T00:00:00.000Z".to_string(),
                topic: topic.clone(),
                uuid: uuid.clone(),
            }));
            expected.entry(topic).or_default().push(uuid);
        }

        let empty = Vec::new();
        for topic_idx in 0..3usize {
            let topic = format!("t{topic_idx}");
            let projected: Vec<String> =
                session.log().topic(&topic).map(|message| message.uuid.clone()).collect();
            prop_assert_eq!(&projected, expected.get(&topic).unwrap_or(&empty));
        }
    });
}

/// Property: directory membership equals a naive set model for any
/// insert/retract interleaving; duplicate inserts are rejected exactly when
/// the model already holds the uuid.
#[test]
fn prop_directory_membership_matches_model() {
    proptest!(|(ops in prop::collection::vec((any::<bool>(), 0..6usize), 0..40))| {
        let mut directory = ChannelDirectory::new();
        let mut model: HashSet<String> = HashSet::new();

        for (insert, index) in ops {
            let uuid = format!("c{index}");
            if insert {
                let inserted = directory.insert_pending("room", uuid.clone());
                prop_assert_eq!(inserted, model.insert(uuid));
            } else {
                let removed = directory.retract(&uuid).is_some();
                prop_assert_eq!(removed, model.remove(&uuid));
            }
        }

        prop_assert_eq!(directory.len(), model.len());
        for uuid in &model {
            prop_assert!(directory.contains(uuid));
        }
    });
}

/// Property: after any sequence of sets, expiry is governed solely by the
/// last one. A sticky set disarms every earlier deadline.
#[test]
fn prop_status_expiry_follows_the_last_set() {
    proptest!(|(sets in prop::collection::vec(
        ("[a-z]{1,6}", prop::option::of(1u64..5000)),
        1..10,
    ))| {
        let env = SimEnv::with_seed(0);
        let mut status = StatusNotifier::new();

        let mut last_clear = None;
        for (text, clear_ms) in sets {
            let clear = clear_ms.map(Duration::from_millis);
            status.set(text, clear, env.now());
            last_clear = clear;
        }

        env.advance(Duration::from_millis(5000));
        let cleared = status.poll(env.now());

        if last_clear.is_some() {
            prop_assert!(cleared);
            prop_assert!(status.current().is_none());
        } else {
            prop_assert!(!cleared);
            prop_assert!(status.current().is_some());
        }
    });
}
