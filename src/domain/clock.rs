/// Time source for wall-clock measured gestures (jump charge).
///
/// The game reads the system clock; tests drive a `ManualClock` so charge
/// durations can be simulated without sleeping.

use std::cell::Cell;
use std::time::{Duration, Instant};

pub trait TimeSource {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[allow(dead_code)]
pub struct ManualClock {
    origin: Instant,
    offset: Cell<Duration>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        ManualClock { origin: Instant::now(), offset: Cell::new(Duration::ZERO) }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_on_advance() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - t0, Duration::from_millis(250));
    }
}
