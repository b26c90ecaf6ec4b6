//! Well-formed raw events for driving a runtime under test.
//!
//! One constructor per backend event channel, producing the exact payload
//! shape the decoder expects. Tests that need a malformed payload build it
//! by hand.

use palaver_proto::{RawEvent, channel};
use serde_json::json;

/// `my-address` identity snapshot.
pub fn my_address(peer_id: &str, addresses: &[&str]) -> RawEvent {
    RawEvent::new(channel::MY_ADDRESS, json!({"peer_id": peer_id, "addresses": addresses}))
}

/// `my-info` identity snapshot.
pub fn my_info(peer_id: &str, addresses: &[&str]) -> RawEvent {
    RawEvent::new(channel::MY_INFO, json!({"peer_id": peer_id, "addresses": addresses}))
}

/// `peer-discovered` sighting.
pub fn peer_discovered(peer_id: &str, address: &str) -> RawEvent {
    RawEvent::new(channel::PEER_DISCOVERED, json!({"peer_id": peer_id, "address": address}))
}

/// `peer-connected` transition.
pub fn peer_connected(peer_id: &str, address: &str) -> RawEvent {
    RawEvent::new(channel::PEER_CONNECTED, json!({"peer_id": peer_id, "address": address}))
}

/// `peer-disconnected` removal.
pub fn peer_disconnected(peer_id: &str) -> RawEvent {
    RawEvent::new(channel::PEER_DISCONNECTED, json!(peer_id))
}

/// `peer-expired` removal.
pub fn peer_expired(peer_id: &str) -> RawEvent {
    RawEvent::new(channel::PEER_EXPIRED, json!(peer_id))
}

/// `peers-list` snapshot.
pub fn peers_list(peer_ids: &[&str]) -> RawEvent {
    RawEvent::new(channel::PEERS_LIST, json!(peer_ids))
}

/// `p2p-message` delivery.
pub fn message(from: &str, content: &str, timestamp: &str, topic: &str, uuid: &str) -> RawEvent {
    RawEvent::new(
        channel::P2P_MESSAGE,
        json!({
            "from": from,
            "content": content,
            "timestamp": timestamp,
            "topic": topic,
            "uuid": uuid,
        }),
    )
}

/// `connection-error` report.
pub fn connection_error(text: &str) -> RawEvent {
    RawEvent::new(channel::CONNECTION_ERROR, json!(text))
}

/// `connection-status` report.
pub fn connection_status(text: &str) -> RawEvent {
    RawEvent::new(channel::CONNECTION_STATUS, json!(text))
}

/// `peer-subscribed` notice.
pub fn peer_subscribed(peer_id: &str, topic: &str) -> RawEvent {
    RawEvent::new(channel::PEER_SUBSCRIBED, json!({"peer_id": peer_id, "topic": topic}))
}
