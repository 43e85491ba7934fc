//! Fixed-interval tick clock driven by frame time.

use std::time::Duration;

/// Converts elapsed frame time into a whole number of due ticks.
///
/// Elapsed time accumulates exactly; a tick is due whenever a full interval
/// has built up, and leftover time carries over to the next call. A long
/// frame yields several ticks rather than dropping any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickClock {
    interval: Duration,
    accumulated: Duration,
}

impl TickClock {
    pub fn new(interval: Duration) -> Self {
        assert!(!interval.is_zero(), "tick interval must be positive");
        Self {
            interval,
            accumulated: Duration::ZERO,
        }
    }

    /// Time accumulated towards the next tick
    pub fn pending(&self) -> Duration {
        self.accumulated
    }

    /// Add elapsed time and return how many ticks became due
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated = self.accumulated.saturating_add(elapsed);

        let whole = self.accumulated.as_nanos() / self.interval.as_nanos();
        let due = u32::try_from(whole).unwrap_or(u32::MAX);
        self.accumulated -= self.interval * due;
        due
    }

    /// Drop accumulated time
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}
