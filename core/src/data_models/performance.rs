use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contracts::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.start > self.end {
            return Err(CoreError::validation(
                "period.start must be <= period.end".to_string(),
            ));
        }
        Ok(())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// # NDOC
/// component: `data_models::performance`
/// purpose: The metric tuple computed by the analytics engine over a closed
///   interaction set.
/// invariants:
///   - `conversion_rate`, `appointment_booking_rate` in `0.0..=1.0`.
///   - `csat` in `0.0..=5.0`; `avg_response_ms >= 0.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricTuple {
    pub total_interactions: u64,
    pub conversion_rate: f64,
    pub avg_response_ms: f64,
    pub appointment_booking_rate: f64,
    pub csat: f64,
}

impl MetricTuple {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0.0..=1.0).contains(&self.conversion_rate) {
            return Err(CoreError::validation(format!(
                "conversion_rate {} must be in 0.0..=1.0",
                self.conversion_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.appointment_booking_rate) {
            return Err(CoreError::validation(format!(
                "appointment_booking_rate {} must be in 0.0..=1.0",
                self.appointment_booking_rate
            )));
        }
        if !(0.0..=5.0).contains(&self.csat) {
            return Err(CoreError::validation(format!(
                "csat {} must be in 0.0..=5.0",
                self.csat
            )));
        }
        if self.avg_response_ms < 0.0 {
            return Err(CoreError::validation(
                "avg_response_ms must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptMetric {
    pub script_id: String,
    pub conversion_rate: f64,
    pub sample_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub text: String,
    pub expected_impact_pct: f64,
}

/// Per-agent metrics over a closed period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSnapshot {
    pub agent_id: String,
    pub period: Period,
    pub metrics: MetricTuple,
    pub script_metrics: Vec<ScriptMetric>,
    pub suggestions: Vec<Suggestion>,
}

impl PerformanceSnapshot {
    pub fn validate(&self) -> Result<(), CoreError> {
        self.period.validate()?;
        self.metrics.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendSignificance {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrendDataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceTrend {
    pub metric: String,
    pub data_points: Vec<TrendDataPoint>,
    pub trend: TrendDirection,
    pub change_percent: f64,
    pub significance: TrendSignificance,
}

/// Classifies a trend direction/significance from a percent change, per the
/// analytics engine's trend classification rule.
pub fn classify_trend(change_percent: f64) -> (TrendDirection, TrendSignificance) {
    let direction = if change_percent.abs() < 2.0 {
        TrendDirection::Stable
    } else if change_percent > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };
    let significance = if change_percent.abs() >= 15.0 {
        TrendSignificance::High
    } else if change_percent.abs() >= 5.0 {
        TrendSignificance::Medium
    } else {
        TrendSignificance::Low
    };
    (direction, significance)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Performance,
    Script,
    Trend,
    Optimization,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub kind: InsightKind,
    pub actionable: bool,
    pub recommendations: Vec<String>,
    pub data: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

impl Insight {
    /// The freshness invariant: `generated_at` must fall within the last
    /// hour relative to `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.generated_at);
        age >= chrono::Duration::zero() && age <= chrono::Duration::hours(1)
    }

    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), CoreError> {
        if !self.actionable {
            return Err(CoreError::validation(
                "insight must be actionable".to_string(),
            ));
        }
        if self.recommendations.is_empty() {
            return Err(CoreError::validation(
                "insight must carry at least one recommendation".to_string(),
            ));
        }
        if self.data.is_null() {
            return Err(CoreError::validation(
                "insight data must be non-empty".to_string(),
            ));
        }
        if !self.is_fresh(now) {
            return Err(CoreError::validation(
                "insight generated_at must be within the last hour".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptOptimization {
    pub script_id: String,
    pub current_metrics: ScriptMetric,
    pub recommendations: Vec<Suggestion>,
}

/// Per the impact report invariants — this struct is also used by the
/// optimization loop's validate step (§4.5.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Improvement {
    pub conversion_rate: f64,
    pub response_time: f64,
    pub satisfaction: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactReport {
    pub agent_id: String,
    pub optimization_id: uuid::Uuid,
    pub baseline: MetricTuple,
    pub current: MetricTuple,
    pub improvement: Improvement,
    pub validated: bool,
}
