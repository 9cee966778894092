//! Virtual-time environment.
//!
//! Time only moves when a test says so, either explicitly through
//! [`SimEnv::advance`] or by a driver awaiting [`Environment::sleep`]. Clones
//! share one clock, so every client in a simulation observes the same time.

use std::{
    ops::{Add, Sub},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use duet_core::Environment;

/// Wall-clock millis reported at virtual time zero (2024-01-01T00:00:00Z).
pub const SIM_EPOCH_MILLIS: u64 = 1_704_067_200_000;

/// Point in virtual time, measured from simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Simulation start.
    pub const ZERO: SimInstant = SimInstant(Duration::ZERO);

    /// Instant `ms` milliseconds after start.
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    /// Time since simulation start.
    pub fn elapsed(self) -> Duration {
        self.0
    }

    /// Milliseconds since simulation start.
    pub fn as_millis(self) -> u64 {
        self.0.as_millis() as u64
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = SimInstant;

    fn add(self, rhs: Duration) -> SimInstant {
        SimInstant(self.0 + rhs)
    }
}

/// Deterministic environment with a shared virtual clock.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    nanos: Arc<AtomicU64>,
}

impl SimEnv {
    /// Fresh clock at [`SimInstant::ZERO`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.nanos.fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Move the clock forward to `instant`. Never moves it backwards.
    pub fn advance_to(&self, instant: SimInstant) {
        self.nanos.fetch_max(instant.elapsed().as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(Duration::from_nanos(self.nanos.load(Ordering::SeqCst)))
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn wall_clock_millis(&self) -> u64 {
        SIM_EPOCH_MILLIS + self.now().as_millis()
    }
}
