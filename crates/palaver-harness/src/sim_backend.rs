//! Scriptable in-memory backend for session testing.
//!
//! Records every command the session issues, serves persisted channel records
//! from memory, and can be scripted to fail specific commands. Failing exactly
//! one call is what exercises the optimistic-update rollback paths.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use palaver_proto::{ChannelRecord, OutboundMessage};
use palaver_session::{Backend, BackendError};

/// Command families that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `send_message`
    SendMessage,
    /// `connect_to_peer`
    ConnectToPeer,
    /// `get_connected_peers`
    GetConnectedPeers,
    /// `get_my_info`
    GetMyInfo,
    /// `add_topic`
    AddTopic,
    /// `add_channel`
    AddChannel,
    /// `get_channels`
    GetChannels,
}

/// One recorded backend command, with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `send_message` with the relayed payload.
    SendMessage(OutboundMessage),
    /// `connect_to_peer` with the dialed address.
    ConnectToPeer(String),
    /// `get_connected_peers`.
    GetConnectedPeers,
    /// `get_my_info`.
    GetMyInfo,
    /// `add_topic` with the subscribed topic name.
    AddTopic(String),
    /// `add_channel` with the persisted record.
    AddChannel(ChannelRecord),
    /// `get_channels`.
    GetChannels,
}

impl BackendCall {
    /// The command family this call belongs to.
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::SendMessage(_) => CommandKind::SendMessage,
            Self::ConnectToPeer(_) => CommandKind::ConnectToPeer,
            Self::GetConnectedPeers => CommandKind::GetConnectedPeers,
            Self::GetMyInfo => CommandKind::GetMyInfo,
            Self::AddTopic(_) => CommandKind::AddTopic,
            Self::AddChannel(_) => CommandKind::AddChannel,
            Self::GetChannels => CommandKind::GetChannels,
        }
    }
}

/// In-memory [`Backend`] that records calls and serves scripted responses.
///
/// Clones share state, so a test can keep one handle for scripting and
/// inspection while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct SimBackend {
    inner: Arc<Mutex<SimState>>,
}

#[derive(Debug, Default)]
struct SimState {
    calls: Vec<BackendCall>,
    failures: HashMap<CommandKind, VecDeque<String>>,
    channels: Vec<ChannelRecord>,
}

impl SimBackend {
    /// Backend with no scripted failures and no persisted channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next occurrence of `kind` to fail with `message`.
    ///
    /// Failures queue up: scripting two failures fails the next two
    /// occurrences in order, after which the command succeeds again.
    pub fn fail_next(&self, kind: CommandKind, message: impl Into<String>) {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("SimBackend mutex poisoned");
        inner.failures.entry(kind).or_default().push_back(message.into());
    }

    /// Seeds the records served by `get_channels`.
    pub fn set_channels(&self, channels: Vec<ChannelRecord>) {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("SimBackend mutex poisoned");
        inner.channels = channels;
    }

    /// Every command received so far, in call order.
    ///
    /// Scripted-to-fail calls are recorded too; the session did issue them.
    pub fn calls(&self) -> Vec<BackendCall> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("SimBackend mutex poisoned");
        inner.calls.clone()
    }

    /// Records `call`, then pops a scripted failure for it if one is queued.
    fn record(&self, call: BackendCall) -> Result<(), BackendError> {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("SimBackend mutex poisoned");
        let kind = call.kind();
        inner.calls.push(call);
        match inner.failures.get_mut(&kind).and_then(VecDeque::pop_front) {
            Some(message) => Err(BackendError::new(message)),
            None => Ok(()),
        }
    }
}

impl Backend for SimBackend {
    async fn send_message(&mut self, message: &OutboundMessage) -> Result<(), BackendError> {
        self.record(BackendCall::SendMessage(message.clone()))
    }

    async fn connect_to_peer(&mut self, address: &str) -> Result<(), BackendError> {
        self.record(BackendCall::ConnectToPeer(address.to_string()))
    }

    async fn get_connected_peers(&mut self) -> Result<(), BackendError> {
        self.record(BackendCall::GetConnectedPeers)
    }

    async fn get_my_info(&mut self) -> Result<(), BackendError> {
        self.record(BackendCall::GetMyInfo)
    }

    async fn add_topic(&mut self, topic: &str) -> Result<(), BackendError> {
        self.record(BackendCall::AddTopic(topic.to_string()))
    }

    async fn add_channel(&mut self, record: &ChannelRecord) -> Result<(), BackendError> {
        self.record(BackendCall::AddChannel(record.clone()))
    }

    async fn get_channels(&mut self) -> Result<Vec<ChannelRecord>, BackendError> {
        self.record(BackendCall::GetChannels)?;
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("SimBackend mutex poisoned");
        Ok(inner.channels.clone())
    }
}
