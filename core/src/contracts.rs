use serde::{Deserialize, Serialize};
use serde_json::Value;

/// # NDOC
/// component: `contracts`
/// purpose: Standard result alias for every core-crossing boundary.
pub type CoreResult<T> = Result<T, CoreError>;

/// # NDOC
/// component: `contracts`
/// purpose: Stable machine-readable error category, matching the error kinds enumerated
///   in the control-plane error handling design.
/// invariants:
///   - Variants are part of the cross-component API surface; changes require compatibility review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CoreErrorKind {
    ValidationError,
    InvalidStateTransition,
    NoBaseline,
    DuplicateConflict,
    ExternalUnavailable,
    Timeout,
    IntegrityError,
}

/// # NDOC
/// component: `contracts`
/// purpose: Canonical error payload used across ingestion, analytics, optimization, and
///   the control plane.
/// invariants:
///   - `message` is user-safe and suitable for surfacing in a webhook response body.
///   - `retryable` indicates whether automated retry is acceptable per the recovery
///     policy table in the error handling design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreError {
    pub kind: CoreErrorKind,
    pub message: String,
    pub retryable: bool,
    pub details: Option<Value>,
}

impl CoreError {
    pub fn new(
        kind: CoreErrorKind,
        message: impl Into<String>,
        retryable: bool,
        details: Option<Value>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            details,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::ValidationError, message, false, None)
    }

    pub fn invalid_state_transition(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::InvalidStateTransition, message, false, None)
    }

    pub fn no_baseline(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::NoBaseline, message, false, None)
    }

    pub fn duplicate_conflict(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::DuplicateConflict, message, true, None)
    }

    pub fn external_unavailable(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::ExternalUnavailable, message, true, None)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Timeout, message, true, None)
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::IntegrityError, message, false, None)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for CoreError {}

impl From<std::io::Error> for CoreError {
    fn from(value: std::io::Error) -> Self {
        CoreError::external_unavailable(value.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(value: serde_json::Error) -> Self {
        CoreError::validation(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_builders_set_expected_values() {
        let err = CoreError::timeout("store call timed out");
        assert_eq!(err.kind, CoreErrorKind::Timeout);
        assert!(err.retryable);
        assert_eq!(err.message, "store call timed out");
    }

    #[test]
    fn invalid_state_transition_is_not_retryable() {
        let err = CoreError::invalid_state_transition("new -> converted is not permitted");
        assert!(!err.retryable);
    }
}
