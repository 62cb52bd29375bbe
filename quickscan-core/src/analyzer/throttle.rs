use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Cool-down window armed by a hard detection failure.
///
/// The deadline is stored as nanoseconds past a fixed epoch so the capture
/// callback can read it without taking a lock.
#[derive(Debug)]
pub struct FailureThrottle {
    epoch: Instant,
    cooldown: Duration,
    until_nanos: AtomicU64,
}

impl FailureThrottle {
    /// An untripped throttle with the given window length.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            cooldown,
            until_nanos: AtomicU64::new(0),
        }
    }

    /// Length of the window armed by [`trip`](Self::trip).
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Arms the window so that frames before `at + cooldown` are dropped.
    pub fn trip(&self, at: Instant) {
        let until = self.offset(at).saturating_add(saturating_nanos(self.cooldown));
        self.until_nanos.store(until, Ordering::Release);
    }

    /// True while `at` falls inside the armed window.
    pub fn is_throttled(&self, at: Instant) -> bool {
        self.offset(at) < self.until_nanos.load(Ordering::Acquire)
    }

    /// Time left in the current window, if any.
    pub fn remaining(&self, at: Instant) -> Option<Duration> {
        let until = self.until_nanos.load(Ordering::Acquire);
        let now = self.offset(at);
        (now < until).then(|| Duration::from_nanos(until - now))
    }

    fn offset(&self, at: Instant) -> u64 {
        saturating_nanos(at.saturating_duration_since(self.epoch))
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
