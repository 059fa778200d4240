//! Clock capability.
//!
//! Statement timestamps and verification times come from an injected clock
//! so tests can control time.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall clock time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_millis() as i64,
            Err(e) => -(e.duration().as_millis() as i64),
        }
    }
}

/// Deterministic clock for tests.
///
/// Every call to `now_ms` returns the current value and then advances it by
/// `step_ms`. With a zero step the time only moves through [`MockClock::advance`].
#[derive(Debug)]
pub struct MockClock {
    time_ms: AtomicI64,
    step_ms: i64,
}

impl MockClock {
    /// A clock fixed at `time_ms`.
    pub fn new(time_ms: i64) -> Self {
        Self::stepping(time_ms, 0)
    }

    /// A clock starting at `time_ms` that ticks `step_ms` per read.
    pub fn stepping(time_ms: i64, step_ms: i64) -> Self {
        Self {
            time_ms: AtomicI64::new(time_ms),
            step_ms,
        }
    }

    pub fn advance(&self, ms: i64) {
        self.time_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, time_ms: i64) {
        self.time_ms.store(time_ms, Ordering::SeqCst);
    }

    /// The value the next `now_ms` call will return.
    pub fn peek(&self) -> i64 {
        self.time_ms.load(Ordering::SeqCst)
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> i64 {
        self.time_ms.fetch_add(self.step_ms, Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}
