use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data_models::optimization::{OptimizationRecommendation, Priority};
use crate::data_models::performance::MetricTuple;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentOperationalStatus {
    Online,
    Offline,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRegistration {
    pub agent_id: String,
    pub status: AgentOperationalStatus,
    pub last_heartbeat_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

/// # NDOC
/// component: `data_models::control_plane`
/// purpose: A strategic directive — a plan with target agents and
///   priorities, lifecycle `draft -> active -> completed|cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Directive {
    pub id: Uuid,
    pub title: String,
    pub target_agent_ids: Vec<String>,
    pub priority: Priority,
    pub status: DirectiveStatus,
    pub created_at: DateTime<Utc>,
}

impl Directive {
    pub fn can_transition_to(&self, to: DirectiveStatus) -> bool {
        use DirectiveStatus::*;
        matches!(
            (self.status, to),
            (Draft, Active) | (Draft, Cancelled) | (Active, Completed) | (Active, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverrideKind {
    SuspendOptimization,
    RedirectRecommendation,
}

/// An operator-issued, typed, timestamped, reversible mutation that
/// temporarily suspends or redirects optimization loop decisions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperatorOverride {
    pub id: Uuid,
    pub kind: OverrideKind,
    pub target_agent_id: Option<String>,
    pub issued_by: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub reversed_at: Option<DateTime<Utc>>,
}

impl OperatorOverride {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if self.reversed_at.is_some() {
            return false;
        }
        match self.expires_at {
            Some(expiry) => now < expiry,
            None => true,
        }
    }
}

/// Read-only dashboard snapshot: current metrics + active optimizations +
/// recent alerts + uptime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub current_metrics_by_agent: Vec<(String, MetricTuple)>,
    pub active_optimizations: Vec<OptimizationRecommendation>,
    pub recent_alert_summaries: Vec<String>,
    pub uptime_seconds: u64,
}
