//! Session error types.
//!
//! One error enum for everything a session caller can see. Backend
//! rejections keep their human-readable text and are surfaced to the caller
//! untouched; no retry or backoff happens in this layer.

use crate::backend::BackendError;

/// Errors surfaced to session callers.
///
/// Decode failures on inbound events are deliberately NOT here: a malformed
/// event is logged and dropped at the runtime boundary
/// (`palaver_proto::EventDecodeError`), it never reaches a caller.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backend rejected an outbound command. Carries the backend's
    /// human-readable failure text, typically rendered as a blocking alert.
    #[error("backend call failed: {0}")]
    Backend(#[from] BackendError),

    /// `connect_to_peer` was given an empty address. The only validation this
    /// layer performs on addresses; the format itself is backend-defined.
    #[error("peer address must not be empty")]
    EmptyPeerAddress,

    /// Join was asked for a channel uuid already present in the directory.
    /// User-visible rejection; the directory is unchanged.
    #[error("already joined channel {uuid}")]
    ChannelAlreadyJoined {
        /// The uuid that was already present.
        uuid: String,
    },

    /// The session runtime shut down before the command completed.
    #[error("session terminated")]
    Terminated,
}
