use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// # NDOC
/// component: `utils::clock`
/// purpose: Capability trait standing in for `Utc::now()` at every call site
///   that participates in scheduling, so delay-progressive sequences and
///   cooldowns are testable under virtual time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a fixed instant, for deterministic unit tests.
pub struct FrozenClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FrozenClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.lock().expect("clock mutex poisoned") = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.instant.lock().expect("clock mutex poisoned");
        *guard = *guard + by;
    }
}

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().expect("clock mutex poisoned")
    }
}

/// A clock that advances by a fixed step on every `now()` call, useful for
/// simulating a sequence of cycles without real sleeps.
pub struct AdvancingClock {
    instant: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl AdvancingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            instant: Mutex::new(start),
            step,
        }
    }
}

impl Clock for AdvancingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut guard = self.instant.lock().expect("clock mutex poisoned");
        let current = *guard;
        *guard = current + self.step;
        current
    }
}
