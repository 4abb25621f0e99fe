use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contracts::{CoreError, CoreErrorKind};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Network,
    Validation,
    System,
    BusinessLogic,
    Authentication,
}

/// # NDOC
/// component: `subsystems::error_monitor::classification`
/// purpose: Maps a `CoreError` into the severity/category pair the error
///   monitor reasons over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedError {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

pub fn classify(error: &CoreError, occurred_at: DateTime<Utc>) -> ClassifiedError {
    let (severity, category) = match error.kind {
        CoreErrorKind::ValidationError => (Severity::Low, Category::Validation),
        CoreErrorKind::InvalidStateTransition => (Severity::Medium, Category::BusinessLogic),
        CoreErrorKind::NoBaseline => (Severity::Low, Category::BusinessLogic),
        CoreErrorKind::DuplicateConflict => (Severity::Medium, Category::BusinessLogic),
        CoreErrorKind::ExternalUnavailable => (Severity::High, Category::Network),
        CoreErrorKind::Timeout => (Severity::High, Category::Network),
        CoreErrorKind::IntegrityError => (Severity::Critical, Category::System),
    };
    ClassifiedError {
        severity,
        category,
        message: error.message.clone(),
        occurred_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_error_classifies_as_critical_system() {
        let err = CoreError::integrity("transaction aborted");
        let classified = classify(&err, Utc::now());
        assert_eq!(classified.severity, Severity::Critical);
        assert_eq!(classified.category, Category::System);
    }

    #[test]
    fn external_unavailable_classifies_as_high_network() {
        let err = CoreError::external_unavailable("store unreachable");
        let classified = classify(&err, Utc::now());
        assert_eq!(classified.severity, Severity::High);
        assert_eq!(classified.category, Category::Network);
    }
}
