//! Client-side coordination layer for peer-to-peer chat.
//!
//! Reconciles an at-least-once backend event stream with user commands into
//! a deduplicated view of peers, topics, and messages. Pure coordination:
//! networking, persistence, and rendering stay on the other side of the
//! [`Backend`] seam and the [`SessionView`] snapshots.
//!
//! # Components
//!
//! - [`Session`]: coordination core owning the stores (peer registry,
//!   message log, channel directory, status notifier)
//! - [`Backend`]: outbound command seam, one method per wire command
//! - [`Environment`]: time and randomness seam for deterministic testing
//! - [`SessionRuntime`] / [`SessionHandle`]: single-task actor driving a
//!   session, with watch-published [`SessionView`] snapshots

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod backend;
mod directory;
mod env;
mod error;
mod log;
mod registry;
mod runtime;
mod session;
mod status;
mod system_env;

pub use backend::{Backend, BackendError};
pub use directory::{Channel, ChannelDirectory, ChannelStage};
pub use env::Environment;
pub use error::SessionError;
pub use log::{Delivery, Message, MessageLog};
pub use registry::{Peer, PeerRegistry, PeerStatus};
pub use runtime::{
    ALERT_CHANNEL_SIZE, COMMAND_CHANNEL_SIZE, EVENT_CHANNEL_SIZE, SessionHandle, SessionRuntime,
    TICK_INTERVAL,
};
pub use session::{OWN_SENDER, PEER_CONNECTED_STATUS, Session, SessionEffect, SessionView};
pub use status::{DEFAULT_STATUS_CLEAR, StatusNotifier};
pub use system_env::SystemEnv;
