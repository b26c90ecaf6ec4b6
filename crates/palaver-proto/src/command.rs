//! Outbound command payloads.
//!
//! Each backend command takes a JSON payload; the structs here are those
//! payloads, field names bit-exact with the contract. The command set itself
//! is the `Backend` trait in `palaver-session` (one method per command);
//! this module only owns the shapes that cross the wire.

use serde::{Deserialize, Serialize};

/// Payload of `send_message`: one outgoing application message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Message body.
    pub msg: String,
    /// Topic the message is scoped to.
    pub topic: String,
    /// Sender peer id as known to the backend.
    pub peer_id: String,
    /// Optional caller-chosen message id. When absent the session fills in
    /// a generated id before relaying, so the local echo and the relayed
    /// copy share one deduplication key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// Persisted channel record: payload of `add_channel`, element of the
/// `get_channels` response.
///
/// This is the durable shape; in-memory channel state (unread count, stage)
/// lives in `palaver-session` and is not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    /// Display name of the channel. Not unique.
    pub topic: String,
    /// Unique subscription identifier.
    pub uuid: String,
    /// Id of the last message seen in this channel, if any. Serializes as
    /// JSON `null` when unset.
    #[serde(default)]
    pub last_message_uuid: Option<String>,
}

impl ChannelRecord {
    /// Record with no last-message marker.
    pub fn new(topic: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self { topic: topic.into(), uuid: uuid.into(), last_message_uuid: None }
    }
}
