use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::contracts::CoreError;
use crate::data_models::performance::{Improvement, MetricTuple};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    RoutingRule,
    ScriptUpdate,
    TimingAdjustment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn weight(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Implementation {
    pub action: String,
    pub parameters: Value,
    pub rollback_plan: Value,
    pub testing_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationCriteria {
    pub metrics: Vec<String>,
    pub min_improvement_pct: f64,
    pub test_days: u32,
    pub significance_threshold: f64,
}

/// # NDOC
/// component: `data_models::optimization`
/// purpose: A proposed mutation synthesized by the optimization loop from
///   analytics insights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationRecommendation {
    pub id: Uuid,
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub expected_impact_pct: f64,
    pub implementation: Implementation,
    pub validation_criteria: ValidationCriteria,
    pub description: String,
    pub agent_id: String,
}

/// Sorts recommendations by priority descending, then expected impact
/// descending; ties preserve insertion order (`sort_by` is stable).
pub fn sort_recommendations(recs: &mut Vec<OptimizationRecommendation>) {
    recs.sort_by(|a, b| {
        b.priority
            .weight()
            .cmp(&a.priority.weight())
            .then(
                b.expected_impact_pct
                    .partial_cmp(&a.expected_impact_pct)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
}

/// Three mutually exclusive outcomes an `OptimizationResult` can be in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OptimizationOutcome {
    Pending,
    Validated,
    RolledBack,
}

/// # NDOC
/// component: `data_models::optimization`
/// purpose: The realized outcome of applying a recommendation.
/// invariants:
///   - Exactly one of `{validated, rollback_required, pending}` holds.
///   - Once non-pending, the result is immutable (no setter mutates it
///     again; callers must treat it as a terminal record).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationResult {
    pub recommendation_id: Uuid,
    pub implemented_at: DateTime<Utc>,
    pub baseline_metrics: MetricTuple,
    pub current_metrics: Option<MetricTuple>,
    pub improvement: Option<Improvement>,
    pub validated: bool,
    pub validated_at: Option<DateTime<Utc>>,
    pub rollback_required: bool,
}

impl OptimizationResult {
    pub fn new(
        recommendation_id: Uuid,
        implemented_at: DateTime<Utc>,
        baseline_metrics: MetricTuple,
    ) -> Self {
        Self {
            recommendation_id,
            implemented_at,
            baseline_metrics,
            current_metrics: None,
            improvement: None,
            validated: false,
            validated_at: None,
            rollback_required: false,
        }
    }

    pub fn outcome(&self) -> OptimizationOutcome {
        if self.validated {
            OptimizationOutcome::Validated
        } else if self.rollback_required {
            OptimizationOutcome::RolledBack
        } else {
            OptimizationOutcome::Pending
        }
    }

    pub fn is_pending(&self) -> bool {
        self.outcome() == OptimizationOutcome::Pending
    }

    /// Marks this result as validated. Fails if already non-pending, per
    /// the immutability-once-resolved invariant.
    pub fn mark_validated(
        &mut self,
        current: MetricTuple,
        improvement: Improvement,
        at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        if !self.is_pending() {
            return Err(CoreError::integrity(
                "optimization result is already resolved".to_string(),
            ));
        }
        self.current_metrics = Some(current);
        self.improvement = Some(improvement);
        self.validated = true;
        self.validated_at = Some(at);
        Ok(())
    }

    pub fn mark_rollback_required(
        &mut self,
        current: MetricTuple,
        improvement: Improvement,
        at: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        if !self.is_pending() {
            return Err(CoreError::integrity(
                "optimization result is already resolved".to_string(),
            ));
        }
        self.current_metrics = Some(current);
        self.improvement = Some(improvement);
        self.rollback_required = true;
        self.validated_at = Some(at);
        Ok(())
    }
}
