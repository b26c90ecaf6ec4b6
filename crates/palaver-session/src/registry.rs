//! Peer registry: lifecycle tracking for remote peers.
//!
//! Two live states per peer (discovered, connected) with removal as an
//! absorbing transition out of the registry entirely - no "disconnected"
//! tombstone is retained. The backend delivers lifecycle events at least
//! once, so every mutation here is idempotent under replay.

use std::collections::HashMap;

/// Observed lifecycle state of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    /// Seen on the network, no connection established.
    Discovered,
    /// Connection established.
    Connected,
}

/// One remote peer as currently observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Stable identifier; the registry key.
    pub peer_id: String,
    /// Last observed network address.
    pub address: String,
    /// Current lifecycle state.
    pub status: PeerStatus,
}

/// Registry of live peers, keyed by peer id.
///
/// At most one entry per id. Mutators return whether observable state
/// changed, so callers know when a view refresh is warranted; replayed
/// events return `false` and change nothing.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: HashMap<String, Peer>,
}

impl PeerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a peer seen on the network.
    ///
    /// Inserts at `Discovered` if the peer is absent; a present peer is left
    /// untouched whatever its state (discovery never downgrades a connected
    /// peer). Returns `true` if the peer was inserted.
    pub fn discovered(&mut self, peer_id: impl Into<String>, address: impl Into<String>) -> bool {
        let peer_id = peer_id.into();
        if self.peers.contains_key(&peer_id) {
            return false;
        }

        self.peers.insert(
            peer_id.clone(),
            Peer { peer_id, address: address.into(), status: PeerStatus::Discovered },
        );
        true
    }

    /// Record an established connection.
    ///
    /// Upserts to `Connected` regardless of prior state and updates the
    /// address. Returns `true` if the entry changed (absent, previously
    /// discovered, or address moved).
    pub fn connected(&mut self, peer_id: impl Into<String>, address: impl Into<String>) -> bool {
        let peer_id = peer_id.into();
        let address = address.into();

        if let Some(peer) = self.peers.get_mut(&peer_id) {
            let changed = peer.status != PeerStatus::Connected || peer.address != address;
            peer.status = PeerStatus::Connected;
            peer.address = address;
            return changed;
        }

        self.peers
            .insert(peer_id.clone(), Peer { peer_id, address, status: PeerStatus::Connected });
        true
    }

    /// Remove a peer entirely.
    ///
    /// Disconnect and expiry both land here; the registry does not
    /// distinguish them. Removing an absent peer is a silent no-op returning
    /// `false`.
    pub fn remove(&mut self, peer_id: &str) -> bool {
        self.peers.remove(peer_id).is_some()
    }

    /// Peer by id. `None` if absent.
    pub fn get(&self, peer_id: &str) -> Option<&Peer> {
        self.peers.get(peer_id)
    }

    /// Whether a peer id is present.
    pub fn contains(&self, peer_id: &str) -> bool {
        self.peers.contains_key(peer_id)
    }

    /// Number of live peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Iterate live peers in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }
}
