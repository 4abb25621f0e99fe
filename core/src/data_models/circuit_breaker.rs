use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// # NDOC
/// component: `data_models::circuit_breaker`
/// purpose: Per-named-resource fault counter gating further calls until a
///   cooldown elapses. Closed by default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CircuitBreaker {
    pub resource: String,
    pub state: BreakerState,
    pub failure_count: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
}

impl CircuitBreaker {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            state: BreakerState::Closed,
            failure_count: 0,
            last_failure_at: None,
            opened_at: None,
        }
    }
}
