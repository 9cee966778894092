//! Environment abstraction for deterministic testing.
//!
//! Decouples the room view from the system clock. Production uses the real
//! monotonic clock; simulations drive a virtual clock forward explicitly so
//! debounce and reconnect timing can be checked without sleeping.

use std::{
    fmt::Debug,
    ops::{Add, Sub},
    time::Duration,
};

/// Instant type usable by the state machines.
///
/// Blanket-implemented for anything that orders, subtracts to a `Duration`
/// and can be offset by one. `std::time::Instant` qualifies, as do virtual
/// instants in the test harness.
pub trait Moment:
    Copy + Ord + Send + Sync + Debug + Sub<Output = Duration> + Add<Duration, Output = Self>
{
}

impl<T> Moment for T where
    T: Copy + Ord + Send + Sync + Debug + Sub<Output = Duration> + Add<Duration, Output = T>
{
}

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards
/// - `wall_clock_millis()` is informational only and never used for ordering
pub trait Environment: Clone + Send + Sync + 'static {
    /// Instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`; simulations use a
    /// virtual instant advanced by the harness.
    type Instant: Moment;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code awaits this. State machines never sleep.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Milliseconds since the Unix epoch, stamped on outbound updates.
    fn wall_clock_millis(&self) -> u64;
}
