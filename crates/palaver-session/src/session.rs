//! Session: the coordination core of the client.
//!
//! [`Session`] owns the four stores (peer registry, message log, channel
//! directory, status notifier) and the two seams through which they meet the
//! world: a [`Backend`] for outbound commands and an [`Environment`] for time
//! and randomness.
//!
//! # Responsibilities
//!
//! - Routes typed backend events to exactly the stores that own the affected
//!   state ([`Session::apply`]).
//! - Validates and issues outbound commands, applying optimistic mutations
//!   and reconciling them against the call outcome.
//! - Drives time-based behavior (status auto-clear) from ticks
//!   ([`Session::poll`]).
//!
//! No I/O happens here except through the backend seam. Every mutation is
//! synchronous within a single method call; the runtime task that owns the
//! session serializes those calls, so the stores need no locking.

use std::time::Duration;

use chrono::SecondsFormat;
use palaver_proto::{BackendEvent, ChannelRecord, InboundMessage, MyInfo, OutboundMessage};

use crate::backend::Backend;
use crate::directory::{Channel, ChannelDirectory};
use crate::env::Environment;
use crate::error::SessionError;
use crate::log::{Message, MessageLog};
use crate::registry::{Peer, PeerRegistry};
use crate::status::{DEFAULT_STATUS_CLEAR, StatusNotifier};

/// Sender label stamped on locally echoed own messages.
pub const OWN_SENDER: &str = "You";

/// Transient status shown when a peer connection is established.
pub const PEER_CONNECTED_STATUS: &str = "Peer connected";

/// Observable consequence of applying an event or a tick.
///
/// The session reports what the host should do, it never renders anything
/// itself. Replayed events that change nothing produce no effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Observable state changed; re-render from a fresh [`SessionView`].
    Refresh,
    /// User-visible failure notification, typically a blocking alert.
    Alert {
        /// Human-readable failure text.
        message: String,
    },
}

/// Immutable snapshot of everything a host renders.
///
/// Cheap to clone relative to render frequency; the runtime publishes one
/// snapshot per observable change over a watch channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    /// Local identity, once the backend has announced it.
    pub my_info: Option<MyInfo>,
    /// Live peers, sorted by peer id for stable rendering.
    pub peers: Vec<Peer>,
    /// Subscribed channels in directory order.
    pub channels: Vec<Channel>,
    /// All messages in arrival order; filter by topic at the edge.
    pub messages: Vec<Message>,
    /// Current ephemeral status line.
    pub status: Option<String>,
}

/// Client-side coordination core.
///
/// Constructed once per connection lifetime, initialized with
/// [`Session::init`], torn down with [`Session::teardown`]. Generic over the
/// backend and environment so production and simulation run the same code.
pub struct Session<B: Backend, E: Environment> {
    backend: B,
    env: E,
    my_info: Option<MyInfo>,
    peers: PeerRegistry,
    log: MessageLog,
    channels: ChannelDirectory,
    status: StatusNotifier<E::Instant>,
}

impl<B: Backend, E: Environment> Session<B, E> {
    /// Create a session with empty stores.
    pub fn new(backend: B, env: E) -> Self {
        Self {
            backend,
            env,
            my_info: None,
            peers: PeerRegistry::new(),
            log: MessageLog::new(),
            channels: ChannelDirectory::new(),
            status: StatusNotifier::new(),
        }
    }

    /// Startup reconciliation: request the local identity and reload
    /// persisted channels.
    ///
    /// Both steps are non-fatal; a failure is logged and the session starts
    /// with whatever state it could recover.
    pub async fn init(&mut self) {
        tracing::info!("session init");
        if let Err(error) = self.request_my_info().await {
            tracing::warn!(%error, "identity request failed at startup");
        }
        if let Err(error) = self.load_channels().await {
            tracing::warn!(%error, "channel load failed at startup");
        }
    }

    /// Route one typed backend event to the stores that own its state.
    ///
    /// Events may be delivered more than once; every branch is idempotent
    /// and a replay that changes nothing produces no effects.
    pub fn apply(&mut self, event: BackendEvent) -> Vec<SessionEffect> {
        match event {
            BackendEvent::MyAddress(info) | BackendEvent::MyInfoUpdate(info) => {
                self.my_info = Some(info);
                vec![SessionEffect::Refresh]
            },
            BackendEvent::PeerDiscovered(seen) => {
                if self.peers.discovered(seen.peer_id, seen.address) {
                    vec![SessionEffect::Refresh]
                } else {
                    vec![]
                }
            },
            BackendEvent::PeerConnected(seen) => {
                self.peers.connected(seen.peer_id, seen.address);
                // The status line changes even when the registry does not,
                // so a replayed connect still refreshes.
                self.status.set(
                    PEER_CONNECTED_STATUS,
                    Some(DEFAULT_STATUS_CLEAR),
                    self.env.now(),
                );
                vec![SessionEffect::Refresh]
            },
            BackendEvent::PeerDisconnected(peer_id) | BackendEvent::PeerExpired(peer_id) => {
                if self.peers.remove(&peer_id) {
                    tracing::debug!(%peer_id, "peer removed");
                    vec![SessionEffect::Refresh]
                } else {
                    vec![]
                }
            },
            BackendEvent::PeersList(peer_ids) => {
                tracing::debug!(count = peer_ids.len(), "peers-list snapshot (informational)");
                vec![]
            },
            BackendEvent::MessageReceived(inbound) => {
                let InboundMessage { from, content, timestamp, topic, uuid } = inbound;
                let stored = self.log.insert(Message {
                    topic,
                    from,
                    content,
                    timestamp,
                    uuid: uuid.clone(),
                    own: false,
                });
                if stored {
                    vec![SessionEffect::Refresh]
                } else {
                    tracing::debug!(%uuid, "duplicate message dropped");
                    vec![]
                }
            },
            BackendEvent::ConnectionError(text) => {
                tracing::warn!(error = %text, "backend reported connection error");
                self.status.clear();
                vec![
                    SessionEffect::Alert { message: format!("Connection error: {text}") },
                    SessionEffect::Refresh,
                ]
            },
            BackendEvent::ConnectionStatus(text) => {
                // Sticky: connection state stays up until superseded.
                self.status.set(text, None, self.env.now());
                vec![SessionEffect::Refresh]
            },
            BackendEvent::PeerSubscribed(sub) => {
                tracing::debug!(
                    peer_id = %sub.peer_id,
                    topic = %sub.topic,
                    "peer subscribed (informational)"
                );
                vec![]
            },
        }
    }

    /// Drive time-based behavior. Called from the runtime tick.
    pub fn poll(&mut self) -> Vec<SessionEffect> {
        if self.status.poll(self.env.now()) {
            vec![SessionEffect::Refresh]
        } else {
            vec![]
        }
    }

    /// Clear ephemeral state and deadlines. Nothing fires afterwards.
    pub fn teardown(&mut self) {
        self.status.clear();
        tracing::info!("session teardown");
    }

    /// Relay a message and append its local echo.
    ///
    /// The echo (sender [`OWN_SENDER`], the relayed uuid, `own = true`) is
    /// appended before the relay is awaited, so it is observable before the
    /// outcome is known. The relay result reconciles the echo's delivery
    /// record: confirmed on ack, failed on rejection. The echo itself is
    /// never retracted.
    ///
    /// Returns the echo uuid. A caller-supplied uuid is kept; otherwise one
    /// is generated and backfilled into the relayed payload so the local and
    /// remote copies share one deduplication key.
    ///
    /// # Errors
    ///
    /// [`SessionError::Backend`] when the relay is rejected; the echo stays
    /// in the log marked [`crate::Delivery::Failed`].
    pub async fn send_message(
        &mut self,
        mut outbound: OutboundMessage,
    ) -> Result<String, SessionError> {
        let uuid = outbound.uuid.clone().unwrap_or_else(|| self.env.new_uuid());
        outbound.uuid = Some(uuid.clone());

        self.log.append_own(Message {
            topic: outbound.topic.clone(),
            from: OWN_SENDER.to_string(),
            content: outbound.msg.clone(),
            timestamp: self.timestamp(),
            uuid: uuid.clone(),
            own: true,
        });

        match self.backend.send_message(&outbound).await {
            Ok(()) => {
                self.log.confirm(&uuid);
                Ok(uuid)
            },
            Err(error) => {
                tracing::warn!(%error, %uuid, "message relay failed");
                self.log.mark_failed(&uuid);
                Err(error.into())
            },
        }
    }

    /// Dial a peer by address.
    ///
    /// # Errors
    ///
    /// [`SessionError::EmptyPeerAddress`] for an empty address, before any
    /// backend call; [`SessionError::Backend`] when the dial is rejected.
    pub async fn connect_to_peer(&mut self, address: &str) -> Result<(), SessionError> {
        if address.is_empty() {
            return Err(SessionError::EmptyPeerAddress);
        }
        self.backend.connect_to_peer(address).await?;
        Ok(())
    }

    /// Ask the backend to re-announce the connected-peer list.
    ///
    /// # Errors
    ///
    /// [`SessionError::Backend`] when the request is rejected.
    pub async fn refresh_peers(&mut self) -> Result<(), SessionError> {
        self.backend.get_connected_peers().await?;
        Ok(())
    }

    /// Ask the backend to re-announce the local identity.
    ///
    /// # Errors
    ///
    /// [`SessionError::Backend`] when the request is rejected.
    pub async fn request_my_info(&mut self) -> Result<(), SessionError> {
        self.backend.get_my_info().await?;
        Ok(())
    }

    /// Subscribe to a topic without touching the channel directory.
    ///
    /// # Errors
    ///
    /// [`SessionError::Backend`] when the subscription is rejected.
    pub async fn subscribe_topic(&mut self, topic: &str) -> Result<(), SessionError> {
        self.backend.add_topic(topic).await?;
        Ok(())
    }

    /// Create a channel under a freshly generated identifier.
    ///
    /// The identifier is regenerated until it does not collide with current
    /// directory membership, then the channel goes through the common
    /// insert/persist/subscribe path. Returns the new uuid.
    ///
    /// # Errors
    ///
    /// [`SessionError::Backend`] when persist or subscribe is rejected; see
    /// [`Session::join_channel`] for the reconciliation rules.
    pub async fn create_channel(&mut self, name: impl Into<String>) -> Result<String, SessionError> {
        let mut uuid = self.env.new_uuid();
        while self.channels.contains(&uuid) {
            uuid = self.env.new_uuid();
        }
        self.join_new(name.into(), uuid.clone()).await?;
        Ok(uuid)
    }

    /// Join a channel under a caller-supplied identifier.
    ///
    /// # Errors
    ///
    /// [`SessionError::ChannelAlreadyJoined`] when the uuid is already in
    /// the directory (directory unchanged). [`SessionError::Backend`] when
    /// persist fails (optimistic entry retracted) or when the follow-up
    /// subscribe fails (entry kept: it is durable and will be resubscribed
    /// on next load).
    pub async fn join_channel(
        &mut self,
        name: impl Into<String>,
        uuid: impl Into<String>,
    ) -> Result<(), SessionError> {
        let uuid = uuid.into();
        if self.channels.contains(&uuid) {
            return Err(SessionError::ChannelAlreadyJoined { uuid });
        }
        self.join_new(name.into(), uuid).await
    }

    /// Common create/join path: optimistic insert, persist, subscribe.
    async fn join_new(&mut self, name: String, uuid: String) -> Result<(), SessionError> {
        self.channels.insert_pending(name.clone(), uuid.clone());

        let record = ChannelRecord::new(name, uuid.clone());
        if let Err(error) = self.backend.add_channel(&record).await {
            tracing::warn!(%error, %uuid, "channel persist failed, retracting optimistic entry");
            self.channels.retract(&uuid);
            return Err(error.into());
        }
        self.channels.confirm(&uuid);

        self.backend.add_topic(&uuid).await?;
        Ok(())
    }

    /// Load persisted channels and resubscribe to each, sequentially.
    ///
    /// The directory is replaced wholesale by the persisted list. A failed
    /// resubscription is logged and does not stop the remaining ones.
    ///
    /// # Errors
    ///
    /// [`SessionError::Backend`] when the load itself is rejected; the
    /// directory is left untouched in that case.
    pub async fn load_channels(&mut self) -> Result<(), SessionError> {
        let records = self.backend.get_channels().await?;
        tracing::info!(count = records.len(), "loaded persisted channels");
        self.channels.replace(records);

        let topics: Vec<String> =
            self.channels.channels().iter().map(|channel| channel.uuid.clone()).collect();
        for topic in topics {
            if let Err(error) = self.backend.add_topic(&topic).await {
                tracing::warn!(%error, %topic, "resubscribe failed, continuing");
            }
        }
        Ok(())
    }

    /// Set the status line locally. `clear_after: None` makes it sticky.
    pub fn set_status(&mut self, text: impl Into<String>, clear_after: Option<Duration>) {
        self.status.set(text, clear_after, self.env.now());
    }

    /// Snapshot of everything a host renders.
    pub fn view(&self) -> SessionView {
        let mut peers: Vec<Peer> = self.peers.iter().cloned().collect();
        peers.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        SessionView {
            my_info: self.my_info.clone(),
            peers,
            channels: self.channels.channels().to_vec(),
            messages: self.log.messages().to_vec(),
            status: self.status.current().map(str::to_string),
        }
    }

    /// Local identity, once announced.
    pub fn my_info(&self) -> Option<&MyInfo> {
        self.my_info.as_ref()
    }

    /// Live peer registry.
    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    /// Message log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Channel directory.
    pub fn channels(&self) -> &ChannelDirectory {
        &self.channels
    }

    /// Current status line. `None` if no message.
    pub fn status(&self) -> Option<&str> {
        self.status.current()
    }

    /// Wall-clock timestamp in the wire format (RFC 3339, millisecond
    /// precision, `Z` suffix).
    fn timestamp(&self) -> String {
        self.env.wall_clock().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
