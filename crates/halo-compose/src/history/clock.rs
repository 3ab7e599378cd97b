//! Time source for record timestamps.

use std::cell::Cell;

/// Supplies the current time in milliseconds since the Unix epoch.
pub trait Clock {
    /// Current time, epoch milliseconds.
    fn now_millis(&self) -> u64;
}

/// Wall-clock time. Uses `Date.now()` on `wasm32` and the system clock
/// elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        web_time::SystemTime::now()
            .duration_since(web_time::UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// A clock that only moves when told to, for deterministic ordering.
#[derive(Debug, Default)]
pub struct ManualClock(Cell<u64>);

impl ManualClock {
    /// Start at `millis`.
    #[must_use]
    pub const fn starting_at(millis: u64) -> Self {
        Self(Cell::new(millis))
    }

    /// Move forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.0.set(self.0.get().saturating_add(millis));
    }

    /// Jump to `millis`.
    pub fn set(&self, millis: u64) {
        self.0.set(millis);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::starting_at(10);
        clock.advance(5);
        assert_eq!(clock.now_millis(), 15);
        clock.set(3);
        assert_eq!((&clock).now_millis(), 3);
    }
}
