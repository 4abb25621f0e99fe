use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::contracts::CoreError;
use crate::data_models::optimization::{OptimizationRecommendation, OptimizationResult, RecommendationKind};
use crate::data_models::performance::MetricTuple;
use crate::external::routing_agent::RoutingAgent;
use crate::subsystems::analytics::impact::compute_improvement;
use crate::subsystems::error_monitor::monitor::ErrorMonitor;

/// Is this active optimization due for validation: `implemented_at +
/// testing_days <= now`.
pub fn is_due(result: &OptimizationResult, testing_days: u32, now: DateTime<Utc>) -> bool {
    result.implemented_at + chrono::Duration::days(testing_days as i64) <= now
}

/// What `validate_one` did with a due optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Validated,
    RolledBack,
    /// `overall` improvement fell in the neutral band; left pending for
    /// another testing cycle.
    StillPending,
}

/// Executes `recommendation.implementation.rollback_plan` as the inverse of
/// whatever `apply.rs` did. A `RoutingRule` was applied via `update_config`,
/// so its rollback restores config via `update_config(rollback_plan)`; a
/// `ScriptUpdate`/`TimingAdjustment` was applied via `add_routing_rule`, so
/// its rollback removes that rule.
async fn execute_rollback(
    recommendation: &OptimizationRecommendation,
    routing_agent: &dyn RoutingAgent,
) -> Result<(), CoreError> {
    match recommendation.kind {
        RecommendationKind::RoutingRule => {
            routing_agent
                .update_config(recommendation.implementation.rollback_plan.clone())
                .await
        }
        RecommendationKind::ScriptUpdate | RecommendationKind::TimingAdjustment => {
            routing_agent.remove_routing_rule(&recommendation.id.to_string()).await
        }
    }
}

/// Validates one due optimization against its baseline, per the
/// three-way outcome: `overall > 5` validates, `overall < -5` rolls back
/// by executing the stored rollback plan, otherwise the optimization is
/// left pending for another cycle. A rollback failure is escalated to the
/// error monitor under the recommendation's agent as the resource.
pub async fn validate_one(
    recommendation: &OptimizationRecommendation,
    result: &mut OptimizationResult,
    current_metrics: MetricTuple,
    routing_agent: &dyn RoutingAgent,
    error_monitor: &ErrorMonitor,
    now: DateTime<Utc>,
) -> ValidationOutcome {
    let improvement = compute_improvement(&result.baseline_metrics, &current_metrics);

    if improvement.overall > 5.0 {
        let _ = result.mark_validated(current_metrics, improvement, now);
        ValidationOutcome::Validated
    } else if improvement.overall < -5.0 {
        let _ = result.mark_rollback_required(current_metrics, improvement, now);
        if let Err(e) = execute_rollback(recommendation, routing_agent).await {
            log::warn!(
                target: "optimization_loop",
                recommendation_id = recommendation.id.to_string().as_str(),
                error = e.message.as_str();
                "rollback plan execution failed"
            );
            error_monitor.record(&recommendation.agent_id, &e).await;
        }
        ValidationOutcome::RolledBack
    } else {
        ValidationOutcome::StillPending
    }
}

/// Validates every active optimization that is due, given the current
/// metrics snapshot for its agent. Optimizations not yet due, or whose
/// improvement falls in the neutral band, are left untouched and remain
/// in `active`.
pub async fn validate_due(
    active: &mut HashMap<Uuid, (OptimizationRecommendation, OptimizationResult)>,
    metrics_by_agent: &HashMap<String, MetricTuple>,
    routing_agent: &dyn RoutingAgent,
    error_monitor: &ErrorMonitor,
    now: DateTime<Utc>,
) -> Vec<Uuid> {
    let mut resolved = Vec::new();
    for (id, (recommendation, result)) in active.iter_mut() {
        if !result.is_pending() {
            continue;
        }
        if !is_due(result, recommendation.implementation.testing_days, now) {
            continue;
        }
        let Some(current) = metrics_by_agent.get(&recommendation.agent_id).copied() else {
            continue;
        };
        let outcome = validate_one(recommendation, result, current, routing_agent, error_monitor, now).await;
        if outcome != ValidationOutcome::StillPending {
            resolved.push(*id);
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::optimization::{Implementation, Priority, RecommendationKind, ValidationCriteria};
    use crate::external::routing_agent::MockRoutingAgent;
    use crate::subsystems::error_monitor::alerts::AlertFanout;
    use crate::utils::clock::FrozenClock;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn sample_rec(kind: RecommendationKind) -> OptimizationRecommendation {
        OptimizationRecommendation {
            id: Uuid::new_v4(),
            kind,
            priority: Priority::High,
            expected_impact_pct: 15.0,
            implementation: Implementation {
                action: "noop".to_string(),
                parameters: json!({}),
                rollback_plan: json!({"action": "restore"}),
                testing_days: 7,
            },
            validation_criteria: ValidationCriteria {
                metrics: vec!["conversion_rate".to_string()],
                min_improvement_pct: 5.0,
                test_days: 7,
                significance_threshold: 0.05,
            },
            description: "d".to_string(),
            agent_id: "agent-1".to_string(),
        }
    }

    fn tuple(conv: f64, resp: f64, csat: f64) -> MetricTuple {
        MetricTuple {
            total_interactions: 100,
            conversion_rate: conv,
            avg_response_ms: resp,
            appointment_booking_rate: 0.3,
            csat,
        }
    }

    fn sample_monitor(now: DateTime<Utc>) -> ErrorMonitor {
        let fanout = AlertFanout::new(Vec::new(), chrono::Duration::minutes(15));
        let clock = Arc::new(FrozenClock::new(now));
        ErrorMonitor::new(Default::default(), fanout, clock)
    }

    #[tokio::test]
    async fn s5_rollback_path_executes_rollback_plan_for_routing_rule() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let rec = sample_rec(RecommendationKind::RoutingRule);
        let mut result = OptimizationResult::new(rec.id, now, tuple(0.60, 50_000.0, 4.0));
        let agent = MockRoutingAgent::new("agent-1");
        let monitor = sample_monitor(now);
        let outcome = validate_one(&rec, &mut result, tuple(0.10, 65_000.0, 3.5), &agent, &monitor, now).await;
        assert_eq!(outcome, ValidationOutcome::RolledBack);
        assert!(result.rollback_required);
        let calls = agent.recorded_calls().await;
        assert!(calls[0].starts_with("update_config:"));
    }

    #[tokio::test]
    async fn rollback_path_removes_routing_rule_for_script_update() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let rec = sample_rec(RecommendationKind::ScriptUpdate);
        let mut result = OptimizationResult::new(rec.id, now, tuple(0.60, 50_000.0, 4.0));
        let agent = MockRoutingAgent::new("agent-1");
        let monitor = sample_monitor(now);
        let outcome = validate_one(&rec, &mut result, tuple(0.10, 65_000.0, 3.5), &agent, &monitor, now).await;
        assert_eq!(outcome, ValidationOutcome::RolledBack);
        let calls = agent.recorded_calls().await;
        assert!(calls[0].starts_with("remove_routing_rule:"));
    }

    #[tokio::test]
    async fn neutral_band_improvement_leaves_optimization_pending() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let rec = sample_rec(RecommendationKind::RoutingRule);
        let mut result = OptimizationResult::new(rec.id, now, tuple(0.50, 50_000.0, 4.0));
        let agent = MockRoutingAgent::new("agent-1");
        let monitor = sample_monitor(now);
        let outcome = validate_one(&rec, &mut result, tuple(0.51, 50_000.0, 4.0), &agent, &monitor, now).await;
        assert_eq!(outcome, ValidationOutcome::StillPending);
        assert!(result.is_pending());
        assert!(agent.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn validate_due_only_resolves_non_neutral_outcomes() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let due_at = now - chrono::Duration::days(8);

        let mut validated_rec = sample_rec(RecommendationKind::RoutingRule);
        validated_rec.agent_id = "agent-1".to_string();
        let validated_result = OptimizationResult::new(validated_rec.id, due_at, tuple(0.50, 50_000.0, 4.0));
        let mut neutral_rec = sample_rec(RecommendationKind::RoutingRule);
        neutral_rec.agent_id = "agent-2".to_string();
        let neutral_result = OptimizationResult::new(neutral_rec.id, due_at, tuple(0.50, 50_000.0, 4.0));

        let mut active = HashMap::new();
        active.insert(validated_rec.id, (validated_rec.clone(), validated_result));
        active.insert(neutral_rec.id, (neutral_rec.clone(), neutral_result));

        let mut metrics_by_agent = HashMap::new();
        metrics_by_agent.insert("agent-1".to_string(), tuple(0.90, 50_000.0, 4.0));
        metrics_by_agent.insert("agent-2".to_string(), tuple(0.51, 50_000.0, 4.0));

        let agent = MockRoutingAgent::new("agent-1");
        let monitor = sample_monitor(now);
        let resolved = validate_due(&mut active, &metrics_by_agent, &agent, &monitor, now).await;

        assert_eq!(resolved, vec![validated_rec.id]);
        assert!(active[&neutral_rec.id].1.is_pending());
    }

    #[test]
    fn not_due_before_testing_days_elapse() {
        let implemented_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let result = OptimizationResult::new(Uuid::new_v4(), implemented_at, tuple(0.5, 1000.0, 4.0));
        let too_soon = implemented_at + chrono::Duration::days(3);
        assert!(!is_due(&result, 7, too_soon));
        let due = implemented_at + chrono::Duration::days(7);
        assert!(is_due(&result, 7, due));
    }
}
