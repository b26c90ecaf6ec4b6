//! Backend trait: the outbound command seam.
//!
//! The [`Backend`] trait decouples the session from the networking engine
//! behind it. Each integration (an IPC bridge in production, `SimBackend` in
//! tests) implements the trait; the session issues every outbound call
//! through it and never touches a socket or a file itself.
//!
//! Method names and payload shapes are bit-exact with the backend command
//! contract. Every call is fallible and uniform: success is an ack (plus,
//! for queries, data), failure is a [`BackendError`] carrying the backend's
//! human-readable message. The trait performs no local state mutation;
//! optimistic updates and their reconciliation are the session's explicit
//! responsibility.

use std::future::Future;

use palaver_proto::{ChannelRecord, OutboundMessage};

/// Human-readable rejection from the backend.
///
/// Every command failure is the same shape: a message intended for the user.
/// No error codes; the backend contract does not define any.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    /// Backend-provided failure text.
    pub message: String,
}

impl BackendError {
    /// Wrap failure text into an error.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Outbound command interface to the networking backend.
///
/// One method per wire command. Implementations provide the transport while
/// the session provides validation, optimistic mutation, and reconciliation.
///
/// # Implementations
///
/// - **Production**: an IPC/event bridge to the networking engine
/// - **Simulation**: `palaver-harness`'s `SimBackend` (call recording,
///   scripted failures)
pub trait Backend: Send {
    /// Relay one application message to the network.
    fn send_message(
        &mut self,
        message: &OutboundMessage,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Dial a peer. Address format is backend-defined.
    fn connect_to_peer(
        &mut self,
        address: &str,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Ask for a fresh `peers-list` event.
    fn get_connected_peers(&mut self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Ask for a fresh `my-info` event.
    fn get_my_info(&mut self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Subscribe to a topic; the topic name is a channel uuid.
    fn add_topic(&mut self, topic: &str) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Persist one channel record.
    fn add_channel(
        &mut self,
        record: &ChannelRecord,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Load all persisted channel records, in stored order.
    fn get_channels(
        &mut self,
    ) -> impl Future<Output = Result<Vec<ChannelRecord>, BackendError>> + Send;
}
