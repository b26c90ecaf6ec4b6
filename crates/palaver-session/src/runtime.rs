//! Session runtime: the single task that owns a [`Session`].
//!
//! [`SessionRuntime::run`] multiplexes three inputs with `tokio::select!`:
//! commands from cloneable [`SessionHandle`]s, raw backend events, and a
//! periodic tick. Each is handled to completion before the next is taken,
//! so every store mutation is serialized through one task and the session
//! needs no locking.
//!
//! Outputs: a [`SessionView`] snapshot published over a watch channel on
//! every observable change, and user-visible failure notifications over a
//! bounded alert channel. The runtime stops on [`SessionHandle::shutdown`],
//! when all handles are dropped, or when the event channel closes; it tears
//! the session down on the way out and nothing fires afterwards.

use std::time::Duration;

use palaver_proto::{BackendEvent, OutboundMessage, RawEvent};
use tokio::sync::{mpsc, oneshot, watch};

use crate::backend::Backend;
use crate::env::Environment;
use crate::error::SessionError;
use crate::session::{Session, SessionEffect, SessionView};

/// Poll cadence for time-based behavior (status auto-clear resolution).
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Handle-to-runtime command channel capacity.
pub const COMMAND_CHANNEL_SIZE: usize = 64;

/// Recommended capacity for the raw-event channel a backend integration
/// feeds into [`SessionRuntime::new`].
pub const EVENT_CHANNEL_SIZE: usize = 256;

/// Runtime-to-host alert channel capacity.
pub const ALERT_CHANNEL_SIZE: usize = 64;

/// One queued command with its reply slot.
#[derive(Debug)]
enum SessionCommand {
    SendMessage {
        message: OutboundMessage,
        reply: oneshot::Sender<Result<String, SessionError>>,
    },
    ConnectPeer {
        address: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    RefreshPeers {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    RequestMyInfo {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SubscribeTopic {
        topic: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    CreateChannel {
        name: String,
        reply: oneshot::Sender<Result<String, SessionError>>,
    },
    JoinChannel {
        name: String,
        uuid: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    LoadChannels {
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SetStatus {
        text: String,
        clear_after: Option<Duration>,
    },
    Shutdown,
}

/// Single-task actor driving a [`Session`].
pub struct SessionRuntime<B: Backend, E: Environment> {
    session: Session<B, E>,
    commands: mpsc::Receiver<SessionCommand>,
    events: mpsc::Receiver<RawEvent>,
    views: watch::Sender<SessionView>,
    alerts: mpsc::Sender<String>,
}

impl<B: Backend, E: Environment> SessionRuntime<B, E> {
    /// Wire a runtime around a session and a raw-event source.
    ///
    /// Returns the runtime (to be consumed by [`SessionRuntime::run`]), the
    /// command handle, the view watch receiver, and the alert receiver. The
    /// watch starts at [`SessionView::default`] until init publishes.
    pub fn new(
        session: Session<B, E>,
        events: mpsc::Receiver<RawEvent>,
    ) -> (Self, SessionHandle, watch::Receiver<SessionView>, mpsc::Receiver<String>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (views_tx, views_rx) = watch::channel(SessionView::default());
        let (alerts_tx, alerts_rx) = mpsc::channel(ALERT_CHANNEL_SIZE);

        let runtime = Self {
            session,
            commands: commands_rx,
            events,
            views: views_tx,
            alerts: alerts_tx,
        };
        (runtime, SessionHandle { commands: commands_tx }, views_rx, alerts_rx)
    }

    /// Run the event loop until shutdown or both inbound channels close.
    pub async fn run(mut self) {
        self.session.init().await;
        self.publish();

        let mut tick = tokio::time::interval(TICK_INTERVAL);

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("all session handles dropped, stopping");
                        break;
                    };
                    if self.execute(command).await {
                        break;
                    }
                    self.publish();
                }

                event = self.events.recv() => {
                    let Some(raw) = event else {
                        tracing::info!("event channel closed, stopping");
                        break;
                    };
                    self.ingest(raw);
                }

                _ = tick.tick() => {
                    let effects = self.session.poll();
                    self.dispatch(effects);
                }
            }
        }

        self.session.teardown();
    }

    /// Execute one command. Returns `true` when the runtime should stop.
    async fn execute(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::SendMessage { message, reply } => {
                let _ = reply.send(self.session.send_message(message).await);
            },
            SessionCommand::ConnectPeer { address, reply } => {
                let _ = reply.send(self.session.connect_to_peer(&address).await);
            },
            SessionCommand::RefreshPeers { reply } => {
                let _ = reply.send(self.session.refresh_peers().await);
            },
            SessionCommand::RequestMyInfo { reply } => {
                let _ = reply.send(self.session.request_my_info().await);
            },
            SessionCommand::SubscribeTopic { topic, reply } => {
                let _ = reply.send(self.session.subscribe_topic(&topic).await);
            },
            SessionCommand::CreateChannel { name, reply } => {
                let _ = reply.send(self.session.create_channel(name).await);
            },
            SessionCommand::JoinChannel { name, uuid, reply } => {
                let _ = reply.send(self.session.join_channel(name, uuid).await);
            },
            SessionCommand::LoadChannels { reply } => {
                let _ = reply.send(self.session.load_channels().await);
            },
            SessionCommand::SetStatus { text, clear_after } => {
                self.session.set_status(text, clear_after);
            },
            SessionCommand::Shutdown => return true,
        }
        false
    }

    /// Decode and apply one raw event; malformed events are logged and
    /// dropped, never fatal.
    fn ingest(&mut self, raw: RawEvent) {
        match BackendEvent::from_raw(raw) {
            Ok(event) => {
                let effects = self.session.apply(event);
                self.dispatch(effects);
            },
            Err(error) => {
                tracing::warn!(%error, "malformed event dropped");
            },
        }
    }

    fn dispatch(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::Refresh => self.publish(),
                SessionEffect::Alert { message } => {
                    if let Err(error) = self.alerts.try_send(message) {
                        tracing::warn!(%error, "alert dropped");
                    }
                },
            }
        }
    }

    fn publish(&self) {
        self.views.send_replace(self.session.view());
    }
}

/// Cloneable command side of a running [`SessionRuntime`].
///
/// Every method queues a command for the runtime task and awaits its reply.
/// All of them return [`SessionError::Terminated`] when the runtime has
/// stopped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Relay a message; resolves to the echo uuid.
    ///
    /// # Errors
    ///
    /// See [`Session::send_message`], plus [`SessionError::Terminated`].
    pub async fn send_message(&self, message: OutboundMessage) -> Result<String, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::SendMessage { message, reply }, rx).await
    }

    /// Dial a peer by address.
    ///
    /// # Errors
    ///
    /// See [`Session::connect_to_peer`], plus [`SessionError::Terminated`].
    pub async fn connect_to_peer(&self, address: impl Into<String>) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::ConnectPeer { address: address.into(), reply }, rx).await
    }

    /// Ask the backend to re-announce the connected-peer list.
    ///
    /// # Errors
    ///
    /// See [`Session::refresh_peers`], plus [`SessionError::Terminated`].
    pub async fn refresh_peers(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::RefreshPeers { reply }, rx).await
    }

    /// Ask the backend to re-announce the local identity.
    ///
    /// # Errors
    ///
    /// See [`Session::request_my_info`], plus [`SessionError::Terminated`].
    pub async fn request_my_info(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::RequestMyInfo { reply }, rx).await
    }

    /// Subscribe to a topic without touching the channel directory.
    ///
    /// # Errors
    ///
    /// See [`Session::subscribe_topic`], plus [`SessionError::Terminated`].
    pub async fn subscribe_topic(&self, topic: impl Into<String>) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::SubscribeTopic { topic: topic.into(), reply }, rx).await
    }

    /// Create a channel under a fresh identifier; resolves to the uuid.
    ///
    /// # Errors
    ///
    /// See [`Session::create_channel`], plus [`SessionError::Terminated`].
    pub async fn create_channel(&self, name: impl Into<String>) -> Result<String, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::CreateChannel { name: name.into(), reply }, rx).await
    }

    /// Join a channel under a caller-supplied identifier.
    ///
    /// # Errors
    ///
    /// See [`Session::join_channel`], plus [`SessionError::Terminated`].
    pub async fn join_channel(
        &self,
        name: impl Into<String>,
        uuid: impl Into<String>,
    ) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            SessionCommand::JoinChannel { name: name.into(), uuid: uuid.into(), reply },
            rx,
        )
        .await
    }

    /// Reload persisted channels and resubscribe to each.
    ///
    /// # Errors
    ///
    /// See [`Session::load_channels`], plus [`SessionError::Terminated`].
    pub async fn load_channels(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(SessionCommand::LoadChannels { reply }, rx).await
    }

    /// Set the status line. Fire-and-forget; no reply.
    ///
    /// # Errors
    ///
    /// [`SessionError::Terminated`] when the runtime has stopped.
    pub async fn set_status(
        &self,
        text: impl Into<String>,
        clear_after: Option<Duration>,
    ) -> Result<(), SessionError> {
        self.commands
            .send(SessionCommand::SetStatus { text: text.into(), clear_after })
            .await
            .map_err(|_| SessionError::Terminated)
    }

    /// Stop the runtime. Idempotent; a no-op once it has stopped.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(SessionCommand::Shutdown).await;
    }

    async fn request<T>(
        &self,
        command: SessionCommand,
        rx: oneshot::Receiver<Result<T, SessionError>>,
    ) -> Result<T, SessionError> {
        self.commands.send(command).await.map_err(|_| SessionError::Terminated)?;
        rx.await.map_err(|_| SessionError::Terminated)?
    }
}
