use std::time::{Duration, Instant};

/// Time source for timeouts held by the notification center.
///
/// Toast expiry, the reconnect delay and the minimum spinner duration all go
/// through this so tests can drive them without sleeping.
pub(crate) trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Manually advanced clock; `sleep` advances instead of blocking
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct FakeClock {
    now: std::cell::Cell<Instant>,
    slept: std::cell::Cell<Duration>,
}

#[cfg(test)]
impl FakeClock {
    pub(crate) fn new() -> Self {
        FakeClock {
            now: std::cell::Cell::new(Instant::now()),
            slept: std::cell::Cell::new(Duration::ZERO),
        }
    }

    pub(crate) fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Total time spent in `sleep`
    pub(crate) fn slept(&self) -> Duration {
        self.slept.get()
    }
}

#[cfg(test)]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.slept.set(self.slept.get() + duration);
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_sleep_advances_time() {
        let clock = FakeClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_millis(300));
        assert_eq!(clock.now() - start, Duration::from_millis(300));
        assert_eq!(clock.slept(), Duration::from_millis(300));
    }
}
