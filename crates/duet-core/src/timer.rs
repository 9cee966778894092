//! Single-slot cancellable timer.
//!
//! At most one deadline is pending at a time. Scheduling replaces whatever was
//! pending, which is how both the debounce and the reconnect timers get their
//! "starting a new one cancels the previous" behavior.

use std::time::Duration;

use crate::env::Moment;

/// One cancellable deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer<I> {
    deadline: Option<I>,
}

impl<I: Moment> Timer<I> {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm the timer to fire at `now + delay`.
    ///
    /// Returns `true` if a pending deadline was replaced.
    pub fn schedule(&mut self, now: I, delay: Duration) -> bool {
        self.deadline.replace(now + delay).is_some()
    }

    /// Disarm the timer. Returns `true` if a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Fire the timer if its deadline has passed.
    ///
    /// Returns `true` exactly once per scheduled deadline; the slot is empty
    /// afterwards.
    pub fn fire_if_due(&mut self, now: I) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            },
            _ => false,
        }
    }

    /// Pending deadline, if armed.
    #[must_use]
    pub fn deadline(&self) -> Option<I> {
        self.deadline
    }

    /// Whether a deadline is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

impl<I: Moment> Default for Timer<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::test_utils::Ms;

    #[test]
    fn fires_once_at_deadline() {
        let mut timer = Timer::new();
        assert!(!timer.schedule(Ms(0), Duration::from_millis(600)));

        assert!(!timer.fire_if_due(Ms(599)));
        assert!(timer.fire_if_due(Ms(600)));
        assert!(!timer.fire_if_due(Ms(601)));
        assert!(!timer.is_pending());
    }

    #[test]
    fn reschedule_replaces_pending_deadline() {
        let mut timer = Timer::new();
        timer.schedule(Ms(0), Duration::from_millis(600));
        assert!(timer.schedule(Ms(100), Duration::from_millis(600)));

        assert_eq!(timer.deadline(), Some(Ms(700)));
        assert!(!timer.fire_if_due(Ms(600)));
        assert!(timer.fire_if_due(Ms(700)));
    }

    #[test]
    fn cancel_prevents_firing() {
        let mut timer = Timer::new();
        timer.schedule(Ms(0), Duration::from_millis(10));
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert!(!timer.fire_if_due(Ms(1_000)));
    }
}
