//! Channel directory: the authoritative in-memory set of subscribed topics.
//!
//! Membership is keyed by channel uuid; display names may collide freely.
//! Entries come from three places: a wholesale replace on startup load,
//! and optimistic inserts from create/join. An optimistic entry starts
//! `Pending` and is either confirmed once its record is persisted or
//! retracted when persistence fails - retraction is the one deletion this
//! layer performs, and it only ever removes an entry that was never durable.
//!
//! Insertion order is preserved: loaded channels keep their persisted order,
//! created channels append.

use std::collections::HashSet;

use palaver_proto::ChannelRecord;

/// Persistence stage of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStage {
    /// Optimistically inserted; the persist call has not resolved yet.
    Pending,
    /// Backed by a persisted record.
    Confirmed,
}

/// One subscribed channel as held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Display name. Not unique.
    pub name: String,
    /// Unique subscription identifier; the directory key.
    pub uuid: String,
    /// Messages seen for this channel while it was not being viewed.
    /// Starts at zero; the persisted record does not carry it.
    pub unread_count: u32,
    /// Id of the last message persisted for this channel, if any.
    pub last_message_uuid: Option<String>,
    /// Persistence stage. Not part of the persisted shape.
    pub stage: ChannelStage,
}

impl Channel {
    /// Channel from a persisted record. Loaded entries are `Confirmed`.
    pub fn from_record(record: ChannelRecord) -> Self {
        Self {
            name: record.topic,
            uuid: record.uuid,
            unread_count: 0,
            last_message_uuid: record.last_message_uuid,
            stage: ChannelStage::Confirmed,
        }
    }

    /// The persisted shape of this channel.
    pub fn record(&self) -> ChannelRecord {
        ChannelRecord {
            topic: self.name.clone(),
            uuid: self.uuid.clone(),
            last_message_uuid: self.last_message_uuid.clone(),
        }
    }
}

/// In-memory set of subscribed channels, keyed by uuid.
#[derive(Debug, Default)]
pub struct ChannelDirectory {
    channels: Vec<Channel>,
    uuids: HashSet<String>,
}

impl ChannelDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole directory with persisted records, in their order.
    pub fn replace(&mut self, records: Vec<ChannelRecord>) {
        self.channels = records.into_iter().map(Channel::from_record).collect();
        self.uuids = self.channels.iter().map(|channel| channel.uuid.clone()).collect();
    }

    /// Optimistically insert a new `Pending` channel.
    ///
    /// Returns `false` (directory unchanged) if the uuid is already present.
    pub fn insert_pending(&mut self, name: impl Into<String>, uuid: impl Into<String>) -> bool {
        let uuid = uuid.into();
        if !self.uuids.insert(uuid.clone()) {
            return false;
        }

        self.channels.push(Channel {
            name: name.into(),
            uuid,
            unread_count: 0,
            last_message_uuid: None,
            stage: ChannelStage::Pending,
        });
        true
    }

    /// Mark a pending entry as persisted.
    ///
    /// Returns `false` if the uuid is absent or already confirmed.
    pub fn confirm(&mut self, uuid: &str) -> bool {
        match self.channels.iter_mut().find(|channel| channel.uuid == uuid) {
            Some(channel) if channel.stage == ChannelStage::Pending => {
                channel.stage = ChannelStage::Confirmed;
                true
            },
            _ => false,
        }
    }

    /// Remove an entry whose persistence failed.
    ///
    /// The reconciliation step for optimistic inserts; returns the removed
    /// channel, or `None` if the uuid is absent.
    pub fn retract(&mut self, uuid: &str) -> Option<Channel> {
        let index = self.channels.iter().position(|channel| channel.uuid == uuid)?;
        self.uuids.remove(uuid);
        Some(self.channels.remove(index))
    }

    /// Whether a uuid is a member of the directory.
    pub fn contains(&self, uuid: &str) -> bool {
        self.uuids.contains(uuid)
    }

    /// Channel by uuid. `None` if absent.
    pub fn get(&self, uuid: &str) -> Option<&Channel> {
        self.channels.iter().find(|channel| channel.uuid == uuid)
    }

    /// All channels in insertion order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Number of subscribed channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
