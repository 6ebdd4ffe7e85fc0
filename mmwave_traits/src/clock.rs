use std::time::{Duration, Instant};

/// Time source for the tracker.
///
/// Everything time-dependent (grace windows, publish cadence, the availability
/// watchdog) is measured in whole milliseconds against an epoch taken from the
/// same clock, so swapping the implementation swaps the whole time base.
pub trait Clock {
    fn now(&self) -> Instant;
    /// Block (or pretend to) for `d`.
    fn sleep(&self, d: Duration);

    /// Whole milliseconds from `epoch` to now; 0 if `epoch` lies in the future.
    fn ms_since(&self, epoch: Instant) -> u64 {
        self.now().saturating_duration_since(epoch).as_millis() as u64
    }
}

/// Wall-clock time via `Instant::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Manually driven clock. Clones share one offset, so a test keeps a handle
    /// while the tracker owns another; `sleep` just moves time forward.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        fn with_offset(&self, f: impl FnOnce(&mut Duration)) {
            if let Ok(mut off) = self.offset.lock() {
                f(&mut off);
            }
        }

        pub fn advance(&self, d: Duration) {
            self.with_offset(|off| *off = off.saturating_add(d));
        }

        pub fn advance_ms(&self, ms: u64) {
            self.advance(Duration::from_millis(ms));
        }

        /// Jump to an absolute offset from the origin (may go backwards).
        pub fn set_offset(&self, d: Duration) {
            self.with_offset(|off| *off = d);
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            let off = self.offset.lock().map_or(Duration::ZERO, |g| *g);
            self.origin + off
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }

}
