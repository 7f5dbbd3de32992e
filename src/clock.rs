//! Time source for decay decisions.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::types::Timestamp;

pub trait Clock: Send + Sync {
    /// Current time in seconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp()
    }
}

/// Controllable time for simulating elapsed days.
///
/// Setting [`ManualClock::NO_OVERRIDE`] turns the override off and the clock
/// reports wall-clock time again.
#[derive(Debug)]
pub struct ManualClock {
    current: AtomicI64,
}

impl ManualClock {
    pub const NO_OVERRIDE: Timestamp = -1;

    pub fn new(start: Timestamp) -> Self {
        Self {
            current: AtomicI64::new(start),
        }
    }

    pub fn set(&self, time: Timestamp) {
        self.current.store(time, Ordering::SeqCst);
    }

    /// Move the override forward. No effect while the override is off.
    pub fn advance(&self, secs: i64) -> Timestamp {
        let mut now = self.current.load(Ordering::SeqCst);
        loop {
            if now == Self::NO_OVERRIDE {
                return SystemClock.now();
            }
            let next = now + secs;
            match self
                .current
                .compare_exchange(now, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => now = actual,
            }
        }
    }

    pub fn disable_override(&self) {
        self.set(Self::NO_OVERRIDE);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        match self.current.load(Ordering::SeqCst) {
            Self::NO_OVERRIDE => SystemClock.now(),
            t => t,
        }
    }
}
