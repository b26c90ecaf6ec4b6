//! Deterministic simulation harness for session testing.
//!
//! In-memory implementations of the Environment and Backend traits for
//! deterministic, reproducible testing without a real backend process.
//!
//! # Determinism
//!
//! [`SimEnv`] owns a virtual clock and a seeded RNG, so identifier generation
//! and status expiry are reproducible from a seed. [`SimBackend`] records every
//! command it receives and can be scripted to fail specific commands, which
//! makes optimistic-update rollback paths testable. The [`event`] module
//! builds well-formed raw events for pushing into a runtime.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod event;
pub mod sim_backend;
pub mod sim_env;

pub use sim_backend::{BackendCall, CommandKind, SimBackend};
pub use sim_env::{SimEnv, SimInstant};
