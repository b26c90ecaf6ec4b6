//! Simulated environment with virtual time and seeded randomness.
//!
//! Time stands still unless a test calls [`SimEnv::advance`], which makes
//! status expiry deterministic. Randomness comes from a seeded `ChaCha8`
//! stream, so generated identifiers are reproducible run to run.

use std::ops::{Add, Sub};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use palaver_session::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed used by [`SimEnv::new`].
const DEFAULT_SEED: u64 = 0x1234_5678_9ABC_DEF0;

/// Wall-clock base for a fresh harness: 2025-01-01T00:00:00Z.
const WALL_BASE_SECS: i64 = 1_735_689_600;

/// An instant on the simulated monotonic clock.
///
/// Wraps elapsed virtual time since harness construction. Ordering and
/// arithmetic behave like `std::time::Instant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(Duration);

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

/// Simulated environment with a virtual clock and a seeded RNG.
///
/// Clones share state: every clone observes the same clock and draws from the
/// same RNG stream, mirroring how production clones share the process clock
/// and OS entropy.
#[derive(Debug, Clone)]
pub struct SimEnv {
    inner: Arc<Mutex<SimInner>>,
}

#[derive(Debug)]
struct SimInner {
    elapsed: Duration,
    rng: ChaCha8Rng,
}

impl SimEnv {
    /// Creates a harness environment with the default seed.
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Creates a harness environment with an explicit seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimInner {
                elapsed: Duration::ZERO,
                rng: ChaCha8Rng::seed_from_u64(seed),
            })),
        }
    }

    /// Advances the virtual clock.
    ///
    /// Both [`Environment::now`] and [`Environment::wall_clock`] move forward
    /// by `delta`; time never advances on its own.
    pub fn advance(&self, delta: Duration) {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("SimEnv mutex poisoned");
        inner.elapsed = inner.elapsed.saturating_add(delta);
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("SimEnv mutex poisoned");
        SimInstant(inner.elapsed)
    }

    fn wall_clock(&self) -> DateTime<Utc> {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("SimEnv mutex poisoned");
        let offset = TimeDelta::from_std(inner.elapsed).unwrap_or_default();
        wall_base().checked_add_signed(offset).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("SimEnv mutex poisoned");
        inner.rng.fill_bytes(buffer);
    }
}

fn wall_base() -> DateTime<Utc> {
    DateTime::from_timestamp(WALL_BASE_SECS, 0).unwrap_or(DateTime::UNIX_EPOCH)
}
