use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data_models::performance::{Insight, PerformanceTrend, ScriptOptimization};

/// # NDOC
/// component: `data_models::feedback`
/// purpose: One bundle pulled by the optimization loop's collect-feedback
///   step — the analytics cross-section a cycle reasons over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationFeedback {
    pub collected_at: DateTime<Utc>,
    pub insights: Vec<Insight>,
    pub current_metrics_by_agent: Vec<(String, crate::data_models::performance::MetricTuple)>,
    pub script_analyses: Vec<ScriptOptimization>,
    pub trends: Vec<PerformanceTrend>,
}

/// A customer-facing review-collection workflow, driven by optimization
/// data (secondary entity per the data model).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSessionStatus {
    Pending,
    Sent,
    Completed,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackSession {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub interaction_id: Uuid,
    pub status: FeedbackSessionStatus,
    pub created_at: DateTime<Utc>,
    pub rating: Option<u8>,
    pub comments: Option<String>,
}
