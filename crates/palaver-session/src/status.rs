//! Status notifier: one ephemeral status line with an auto-clear deadline.
//!
//! The deadline is data, not a detached timer. Setting a new status replaces
//! text and deadline together, so a superseded deadline simply ceases to
//! exist - the old fire-later-anyway race cannot happen. `poll` is the only
//! clearing path besides an explicit `clear`; the session runtime drives it
//! from its tick.

use std::ops::Add;
use std::time::Duration;

/// Auto-clear delay applied to transient notices (peer connected, etc.).
pub const DEFAULT_STATUS_CLEAR: Duration = Duration::from_millis(3000);

/// Holder of the single current status string and its expiry deadline.
///
/// Generic over the environment's instant type so simulated clocks drive
/// expiry in tests exactly like real time does in production.
#[derive(Debug)]
pub struct StatusNotifier<I> {
    current: Option<String>,
    clears_at: Option<I>,
}

impl<I> Default for StatusNotifier<I> {
    fn default() -> Self {
        Self { current: None, clears_at: None }
    }
}

impl<I: Copy + Ord + Add<Duration, Output = I>> StatusNotifier<I> {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status, replacing any previous text and deadline wholesale.
    ///
    /// `clear_after: Some(d)` arms expiry at `now + d`; `None` makes the
    /// status sticky until superseded or cleared.
    pub fn set(&mut self, text: impl Into<String>, clear_after: Option<Duration>, now: I) {
        self.current = Some(text.into());
        self.clears_at = clear_after.map(|delay| now + delay);
    }

    /// Clear expired status.
    ///
    /// Returns `true` if a status was cleared by this call.
    pub fn poll(&mut self, now: I) -> bool {
        match self.clears_at {
            Some(deadline) if now >= deadline => {
                self.current = None;
                self.clears_at = None;
                true
            },
            _ => false,
        }
    }

    /// Drop the status and its deadline immediately.
    ///
    /// Returns `true` if there was a status to drop.
    pub fn clear(&mut self) -> bool {
        self.clears_at = None;
        self.current.take().is_some()
    }

    /// Current status text, if any.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}
