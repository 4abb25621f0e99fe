use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::data_models::circuit_breaker::{BreakerState, CircuitBreaker};
use crate::utils::clock::Clock;

/// # NDOC
/// component: `subsystems::error_monitor::circuit_breaker`
/// purpose: Process-wide registry of per-resource circuit breakers, keyed
///   by resource name (e.g. `gmail.poll`, `store.write`,
///   `message_sender.email`). Each resource gets its own lock so a call
///   against one resource never blocks behind another's; the outer map
///   lock is only ever held for the instant it takes to get-or-insert that
///   per-resource lock.
pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<String, Arc<Mutex<CircuitBreaker>>>>,
    failure_threshold: u32,
    backoff: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl CircuitBreakerRegistry {
    pub fn new(failure_threshold: u32, backoff: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
            failure_threshold,
            backoff,
            clock,
        }
    }

    async fn lock_for(&self, resource: &str) -> Arc<Mutex<CircuitBreaker>> {
        let mut breakers = self.breakers.lock().await;
        breakers
            .entry(resource.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CircuitBreaker::new(resource))))
            .clone()
    }

    /// Returns `true` iff a call against `resource` is currently permitted:
    /// the breaker is closed, or open-but-past-backoff (half-open probe).
    pub async fn allow_call(&self, resource: &str) -> bool {
        let lock = self.lock_for(resource).await;
        let mut breaker = lock.lock().await;
        match breaker.state {
            BreakerState::Closed => true,
            BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let now = self.clock.now();
                let opened_at = breaker.opened_at.unwrap_or(now);
                if now.signed_duration_since(opened_at) >= self.backoff {
                    breaker.state = BreakerState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub async fn record_success(&self, resource: &str) {
        let lock = self.lock_for(resource).await;
        let mut breaker = lock.lock().await;
        breaker.state = BreakerState::Closed;
        breaker.failure_count = 0;
        breaker.opened_at = None;
    }

    /// Records a failure. Returns `true` if this call caused the breaker to
    /// open (used by the caller to escalate a circuit breaker trip).
    pub async fn record_failure(&self, resource: &str) -> bool {
        let now = self.clock.now();
        let lock = self.lock_for(resource).await;
        let mut breaker = lock.lock().await;
        breaker.failure_count += 1;
        breaker.last_failure_at = Some(now);
        if breaker.state == BreakerState::HalfOpen {
            breaker.state = BreakerState::Open;
            breaker.opened_at = Some(now);
            return true;
        }
        if breaker.failure_count >= self.failure_threshold && breaker.state != BreakerState::Open {
            breaker.state = BreakerState::Open;
            breaker.opened_at = Some(now);
            return true;
        }
        false
    }

    pub async fn state_of(&self, resource: &str) -> BreakerState {
        let lock = self.lock_for(resource).await;
        let state = lock.lock().await.state;
        state
    }

    pub async fn open_breaker_count(&self) -> usize {
        let snapshot: Vec<Arc<Mutex<CircuitBreaker>>> = self.breakers.lock().await.values().cloned().collect();
        let mut count = 0;
        for breaker in snapshot {
            if breaker.lock().await.state == BreakerState::Open {
                count += 1;
            }
        }
        count
    }

    pub async fn last_failure_at(&self, resource: &str) -> Option<DateTime<Utc>> {
        let lock = self.lock_for(resource).await;
        let last_failure_at = lock.lock().await.last_failure_at;
        last_failure_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::FrozenClock;
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn breaker_opens_after_n_consecutive_failures() {
        let clock = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let registry = CircuitBreakerRegistry::new(3, Duration::minutes(5), clock);
        assert!(!registry.record_failure("gmail.poll").await);
        assert!(!registry.record_failure("gmail.poll").await);
        assert!(registry.record_failure("gmail.poll").await);
        assert!(!registry.allow_call("gmail.poll").await);
    }

    #[tokio::test]
    async fn half_open_probe_permitted_after_backoff() {
        let clock = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let registry = CircuitBreakerRegistry::new(1, Duration::minutes(5), clock.clone());
        registry.record_failure("store.write").await;
        assert!(!registry.allow_call("store.write").await);
        clock.advance(Duration::minutes(6));
        assert!(registry.allow_call("store.write").await);
        assert_eq!(registry.state_of("store.write").await, BreakerState::HalfOpen);
    }

    #[tokio::test]
    async fn success_closes_breaker_and_resets_failure_count() {
        let clock = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let registry = CircuitBreakerRegistry::new(2, Duration::minutes(5), clock);
        registry.record_failure("store.write").await;
        registry.record_success("store.write").await;
        assert_eq!(registry.state_of("store.write").await, BreakerState::Closed);
    }
}
