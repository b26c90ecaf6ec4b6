//! Wire contract for the palaver backend
//!
//! The networking backend speaks a fixed command/event contract: outbound
//! commands are named calls with JSON payloads, inbound events arrive on
//! named channels carrying JSON payloads. This crate owns both sides of that
//! contract as plain data: the raw event envelope, the closed set of typed
//! events with decoding, and the command payload shapes.
//!
//! Names and payload shapes are bit-exact with the backend. Coordination
//! logic lives in `palaver-session`; nothing here mutates state.
//!
//! # Components
//!
//! - [`RawEvent`]: the `{channel, payload}` envelope a backend pushes
//! - [`BackendEvent`]: closed typed event set, decoded via
//!   [`BackendEvent::from_raw`]
//! - [`OutboundMessage`], [`ChannelRecord`]: command payload shapes

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod command;
mod event;

pub use command::{ChannelRecord, OutboundMessage};
pub use event::{
    BackendEvent, EVENT_CHANNELS, EventDecodeError, InboundMessage, MyInfo, PeerSeen, PeerTopic,
    RawEvent, channel,
};
