//! Message log: deduplicated, arrival-ordered message store.
//!
//! One flat sequence for all topics; per-topic views are a pure filter
//! projection, no physical partitioning. The log enforces at-most-once
//! visibility over the backend's at-least-once delivery: the first insert of
//! a uuid wins, every later one is discarded. Arrival order defines the
//! stored order; timestamps are display data and never reorder anything.
//!
//! Own messages are appended optimistically when a send starts, before the
//! relay outcome is known. The message itself is immutable once stored;
//! its relay outcome lives in a separate delivery ledger
//! (pending → confirmed | failed) keyed by uuid.

use std::collections::{HashMap, HashSet};

/// One chat message as stored.
///
/// Never mutated after insertion. `uuid` is the deduplication key and is
/// unique within the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Topic the message is scoped to.
    pub topic: String,
    /// Sender: a peer id, or the fixed own-sender label for local echoes.
    pub from: String,
    /// Message body.
    pub content: String,
    /// ISO-8601 timestamp (sender-side for remote messages, local wall clock
    /// for own echoes). Display data only.
    pub timestamp: String,
    /// Globally unique message id.
    pub uuid: String,
    /// Whether this message originated locally.
    pub own: bool,
}

/// Relay outcome of an optimistically appended own message.
///
/// The three-state record that reconciles optimism with reality: every echo
/// starts `Pending` and is marked once the awaited relay resolves. The
/// message stays in the log in every state; a failed relay marks, never
/// retracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Relay call still in flight.
    Pending,
    /// Backend acknowledged the relay.
    Confirmed,
    /// Backend rejected the relay.
    Failed,
}

/// Deduplicated, arrival-ordered message store.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    seen: HashSet<String>,
    delivery: HashMap<String, Delivery>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message, deduplicating by uuid.
    ///
    /// Returns `true` if the message was stored; `false` if its uuid was
    /// already present (the stored message wins, the new one is dropped).
    pub fn insert(&mut self, message: Message) -> bool {
        if !self.seen.insert(message.uuid.clone()) {
            return false;
        }

        self.messages.push(message);
        true
    }

    /// Append a local echo and open its delivery record at `Pending`.
    ///
    /// Same dedup rule as [`insert`](Self::insert): a duplicate uuid stores
    /// nothing and opens no record.
    pub fn append_own(&mut self, message: Message) -> bool {
        let uuid = message.uuid.clone();
        if !self.insert(message) {
            return false;
        }

        self.delivery.insert(uuid, Delivery::Pending);
        true
    }

    /// Mark a pending echo as acknowledged.
    ///
    /// Returns `false` if the uuid has no pending record (unknown, remote,
    /// or already resolved).
    pub fn confirm(&mut self, uuid: &str) -> bool {
        self.resolve(uuid, Delivery::Confirmed)
    }

    /// Mark a pending echo as rejected. The message stays in the log.
    ///
    /// Returns `false` if the uuid has no pending record.
    pub fn mark_failed(&mut self, uuid: &str) -> bool {
        self.resolve(uuid, Delivery::Failed)
    }

    fn resolve(&mut self, uuid: &str, outcome: Delivery) -> bool {
        match self.delivery.get_mut(uuid) {
            Some(state @ Delivery::Pending) => {
                *state = outcome;
                true
            },
            _ => false,
        }
    }

    /// Delivery state of an own message. `None` for remote or unknown uuids.
    pub fn delivery(&self, uuid: &str) -> Option<Delivery> {
        self.delivery.get(uuid).copied()
    }

    /// Whether a uuid is already stored.
    pub fn contains(&self, uuid: &str) -> bool {
        self.seen.contains(uuid)
    }

    /// All messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages scoped to one topic, in arrival order.
    pub fn topic<'a>(&'a self, topic: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages.iter().filter(move |message| message.topic == topic)
    }

    /// Total number of stored messages across all topics.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
