//! Production Environment implementation using system time.
//!
//! `SystemEnv` uses the real monotonic clock and tokio sleeping, so timing in
//! production is wall-clock timing. Tests use the harness's virtual clock
//! instead.

use std::time::{Duration, UNIX_EPOCH};

use duet_core::Environment;

/// Production environment using system time.
///
/// Uses `std::time::Instant::now()` for time, `tokio::time::sleep()` for async
/// sleeping and `SystemTime` for the timestamps stamped on outbound updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    #[allow(clippy::disallowed_methods)]
    fn wall_clock_millis(&self) -> u64 {
        // A clock set before 1970 only affects the informational timestamp.
        std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}
