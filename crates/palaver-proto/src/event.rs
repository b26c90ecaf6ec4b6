//! Inbound backend events and their decoding.
//!
//! The backend pushes events on named channels with JSON payloads. Dispatching
//! on raw channel strings scattered through the codebase is how events get
//! silently dropped when a name is misspelled or the contract drifts, so the
//! whole inbound surface is a single closed enum: [`BackendEvent::from_raw`]
//! either produces a typed event or a [`EventDecodeError`] that the caller
//! logs and drops. Unknown channel names are decode errors, never ignored
//! strings.
//!
//! # Invariants
//!
//! - Channel Uniqueness: each variant maps to exactly one channel name;
//!   [`BackendEvent::channel`] and [`BackendEvent::from_raw`] are exhaustive
//!   matches, so adding a variant without wiring both fails to compile.
//! - [`EVENT_CHANNELS`] lists every recognized channel exactly once; a
//!   backend integration subscribing to that list receives precisely the
//!   events this layer consumes.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Channel names the backend delivers events on.
///
/// String constants rather than enum discriminants because the wire contract
/// is name-keyed; the names are bit-exact with the backend.
pub mod channel {
    /// Local node address snapshot, sent once the transport is up.
    pub const MY_ADDRESS: &str = "my-address";
    /// Local identity snapshot, sent in response to `get_my_info`.
    pub const MY_INFO: &str = "my-info";
    /// A peer was seen on the network but not yet connected.
    pub const PEER_DISCOVERED: &str = "peer-discovered";
    /// A connection to a peer was established.
    pub const PEER_CONNECTED: &str = "peer-connected";
    /// A peer disconnected explicitly.
    pub const PEER_DISCONNECTED: &str = "peer-disconnected";
    /// A peer was dropped after its liveness window lapsed.
    pub const PEER_EXPIRED: &str = "peer-expired";
    /// Snapshot of currently connected peer ids.
    pub const PEERS_LIST: &str = "peers-list";
    /// An application message arrived from the network.
    pub const P2P_MESSAGE: &str = "p2p-message";
    /// The backend reported a connection-level failure.
    pub const CONNECTION_ERROR: &str = "connection-error";
    /// The backend reported a human-readable connection state change.
    pub const CONNECTION_STATUS: &str = "connection-status";
    /// A peer subscribed to a topic.
    pub const PEER_SUBSCRIBED: &str = "peer-subscribed";
}

/// Every channel this layer consumes, in contract order.
///
/// Integrations subscribe to exactly this set for the lifetime of a session.
pub const EVENT_CHANNELS: [&str; 11] = [
    channel::MY_ADDRESS,
    channel::MY_INFO,
    channel::PEER_DISCOVERED,
    channel::PEER_CONNECTED,
    channel::PEER_DISCONNECTED,
    channel::PEER_EXPIRED,
    channel::PEERS_LIST,
    channel::P2P_MESSAGE,
    channel::CONNECTION_ERROR,
    channel::CONNECTION_STATUS,
    channel::PEER_SUBSCRIBED,
];

/// Raw event envelope as pushed by a backend integration.
///
/// The payload stays an opaque [`serde_json::Value`] until
/// [`BackendEvent::from_raw`] decodes it against the channel name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Channel name the event arrived on.
    pub channel: String,
    /// Undecoded JSON payload.
    pub payload: serde_json::Value,
}

impl RawEvent {
    /// Wrap a channel name and payload into an envelope.
    pub fn new(channel: impl Into<String>, payload: serde_json::Value) -> Self {
        Self { channel: channel.into(), payload }
    }
}

/// Local identity snapshot: stable peer id plus listen addresses.
///
/// Replaced wholesale on every `my-address`/`my-info` event; fields are never
/// merged individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyInfo {
    /// Stable identifier of the local node.
    pub peer_id: String,
    /// Listen addresses in backend order.
    pub addresses: Vec<String>,
}

/// Payload of `peer-discovered` and `peer-connected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSeen {
    /// Stable identifier of the remote peer.
    pub peer_id: String,
    /// Network address the peer was observed at.
    pub address: String,
}

/// Payload of `p2p-message`: one application message from the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Sender peer id.
    pub from: String,
    /// Message body.
    pub content: String,
    /// Sender-side ISO-8601 timestamp. Informational; arrival order, not
    /// timestamp order, defines log order.
    pub timestamp: String,
    /// Topic the message is scoped to.
    pub topic: String,
    /// Globally unique message id; the deduplication key.
    pub uuid: String,
}

/// Payload of `peer-subscribed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerTopic {
    /// Peer that subscribed.
    pub peer_id: String,
    /// Topic it subscribed to.
    pub topic: String,
}

/// Typed inbound event set.
///
/// Decoded from a [`RawEvent`], one variant per channel in
/// [`EVENT_CHANNELS`]. Consumers match exhaustively; there is no catch-all
/// variant, so contract growth surfaces as decode errors here rather than as
/// silently dropped events downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    /// Local address snapshot (`my-address`). Replaces the identity wholesale.
    MyAddress(MyInfo),
    /// Local identity snapshot (`my-info`). Replaces the identity wholesale.
    MyInfoUpdate(MyInfo),
    /// Peer seen on the network (`peer-discovered`).
    PeerDiscovered(PeerSeen),
    /// Peer connection established (`peer-connected`).
    PeerConnected(PeerSeen),
    /// Peer disconnected explicitly (`peer-disconnected`); payload is the
    /// peer id.
    PeerDisconnected(String),
    /// Peer dropped on liveness timeout (`peer-expired`); payload is the
    /// peer id.
    PeerExpired(String),
    /// Connected-peer-id snapshot (`peers-list`). Informational; defines no
    /// state mutation in this layer.
    PeersList(Vec<String>),
    /// Application message from the network (`p2p-message`).
    MessageReceived(InboundMessage),
    /// Connection-level failure report (`connection-error`).
    ConnectionError(String),
    /// Connection state change (`connection-status`).
    ConnectionStatus(String),
    /// Remote peer subscribed to a topic (`peer-subscribed`). Informational;
    /// defines no state mutation in this layer.
    PeerSubscribed(PeerTopic),
}

impl BackendEvent {
    /// Decode a raw envelope into a typed event.
    ///
    /// At-least-once delivery means the same logical event may arrive
    /// repeatedly; decoding is pure and stateless, deduplication is the
    /// stores' concern.
    ///
    /// # Errors
    ///
    /// - [`EventDecodeError::UnknownChannel`] for a channel name outside
    ///   [`EVENT_CHANNELS`]
    /// - [`EventDecodeError::InvalidPayload`] when the payload does not match
    ///   the channel's declared shape
    pub fn from_raw(raw: RawEvent) -> Result<Self, EventDecodeError> {
        let event = match raw.channel.as_str() {
            channel::MY_ADDRESS => Self::MyAddress(decode(channel::MY_ADDRESS, raw.payload)?),
            channel::MY_INFO => Self::MyInfoUpdate(decode(channel::MY_INFO, raw.payload)?),
            channel::PEER_DISCOVERED => {
                Self::PeerDiscovered(decode(channel::PEER_DISCOVERED, raw.payload)?)
            },
            channel::PEER_CONNECTED => {
                Self::PeerConnected(decode(channel::PEER_CONNECTED, raw.payload)?)
            },
            channel::PEER_DISCONNECTED => {
                Self::PeerDisconnected(decode(channel::PEER_DISCONNECTED, raw.payload)?)
            },
            channel::PEER_EXPIRED => Self::PeerExpired(decode(channel::PEER_EXPIRED, raw.payload)?),
            channel::PEERS_LIST => Self::PeersList(decode(channel::PEERS_LIST, raw.payload)?),
            channel::P2P_MESSAGE => Self::MessageReceived(decode(channel::P2P_MESSAGE, raw.payload)?),
            channel::CONNECTION_ERROR => {
                Self::ConnectionError(decode(channel::CONNECTION_ERROR, raw.payload)?)
            },
            channel::CONNECTION_STATUS => {
                Self::ConnectionStatus(decode(channel::CONNECTION_STATUS, raw.payload)?)
            },
            channel::PEER_SUBSCRIBED => {
                Self::PeerSubscribed(decode(channel::PEER_SUBSCRIBED, raw.payload)?)
            },
            _ => return Err(EventDecodeError::UnknownChannel(raw.channel)),
        };

        Ok(event)
    }

    /// Channel name this event arrives on.
    #[must_use]
    pub const fn channel(&self) -> &'static str {
        match self {
            Self::MyAddress(_) => channel::MY_ADDRESS,
            Self::MyInfoUpdate(_) => channel::MY_INFO,
            Self::PeerDiscovered(_) => channel::PEER_DISCOVERED,
            Self::PeerConnected(_) => channel::PEER_CONNECTED,
            Self::PeerDisconnected(_) => channel::PEER_DISCONNECTED,
            Self::PeerExpired(_) => channel::PEER_EXPIRED,
            Self::PeersList(_) => channel::PEERS_LIST,
            Self::MessageReceived(_) => channel::P2P_MESSAGE,
            Self::ConnectionError(_) => channel::CONNECTION_ERROR,
            Self::ConnectionStatus(_) => channel::CONNECTION_STATUS,
            Self::PeerSubscribed(_) => channel::PEER_SUBSCRIBED,
        }
    }
}

fn decode<T: DeserializeOwned>(
    channel: &'static str,
    payload: serde_json::Value,
) -> Result<T, EventDecodeError> {
    serde_json::from_value(payload)
        .map_err(|source| EventDecodeError::InvalidPayload { channel, source })
}

/// Why a raw event could not be decoded.
///
/// Decode failures are logged and dropped by the session runtime; they are
/// never fatal and never partially applied.
#[derive(Debug, thiserror::Error)]
pub enum EventDecodeError {
    /// Channel name outside the recognized contract.
    #[error("unknown event channel: {0}")]
    UnknownChannel(String),

    /// Recognized channel, payload does not match its shape.
    #[error("invalid payload on {channel}: {source}")]
    InvalidPayload {
        /// Channel the malformed payload arrived on.
        channel: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}
