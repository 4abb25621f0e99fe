use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::contracts::CoreResult;
use crate::data_models::optimization::{OptimizationRecommendation, OptimizationResult, RecommendationKind};
use crate::data_models::performance::MetricTuple;
use crate::external::routing_agent::RoutingAgent;

/// # NDOC
/// component: `subsystems::optimization_loop::apply`
/// purpose: Applies one recommendation against its target `RoutingAgent`
///   and records an `OptimizationResult` baselined against the current
///   metrics snapshot.
pub async fn apply(
    recommendation: &OptimizationRecommendation,
    routing_agent: &dyn RoutingAgent,
    current_metrics: MetricTuple,
    now: DateTime<Utc>,
) -> CoreResult<OptimizationResult> {
    match recommendation.kind {
        RecommendationKind::RoutingRule => {
            routing_agent.update_config(recommendation.implementation.parameters.clone()).await?;
        }
        RecommendationKind::ScriptUpdate | RecommendationKind::TimingAdjustment => {
            routing_agent
                .add_routing_rule(recommendation.implementation.parameters.clone())
                .await?;
        }
    }

    Ok(OptimizationResult::new(recommendation.id, now, current_metrics))
}

/// Applies a batch of recommendations in priority order (callers must have
/// already sorted them), collecting active optimizations by id.
pub async fn apply_batch(
    recommendations: &[OptimizationRecommendation],
    routing_agent: &dyn RoutingAgent,
    current_metrics: MetricTuple,
    now: DateTime<Utc>,
) -> HashMap<Uuid, OptimizationResult> {
    let mut active = HashMap::new();
    for rec in recommendations {
        match apply(rec, routing_agent, current_metrics, now).await {
            Ok(result) => {
                active.insert(rec.id, result);
            }
            Err(e) => {
                log::warn!(
                    target: "optimization_loop",
                    recommendation_id = rec.id.to_string().as_str(),
                    error = e.message.as_str();
                    "failed to apply recommendation"
                );
            }
        }
    }
    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::optimization::{Implementation, Priority, ValidationCriteria};
    use crate::external::routing_agent::MockRoutingAgent;
    use serde_json::json;

    fn sample_rec(kind: RecommendationKind) -> OptimizationRecommendation {
        OptimizationRecommendation {
            id: Uuid::new_v4(),
            kind,
            priority: Priority::High,
            expected_impact_pct: 15.0,
            implementation: Implementation {
                action: "noop".to_string(),
                parameters: json!({"urgency_threshold": 5}),
                rollback_plan: json!({}),
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

    fn sample_metrics() -> MetricTuple {
        MetricTuple {
            total_interactions: 10,
            conversion_rate: 0.5,
            avg_response_ms: 1000.0,
            appointment_booking_rate: 0.3,
            csat: 4.0,
        }
    }

    #[tokio::test]
    async fn routing_rule_recommendation_calls_update_config() {
        let agent = MockRoutingAgent::new("agent-1");
        let rec = sample_rec(RecommendationKind::RoutingRule);
        let result = apply(&rec, &agent, sample_metrics(), Utc::now()).await.unwrap();
        assert!(result.is_pending());
        let calls = agent.recorded_calls().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("update_config:"));
    }

    #[tokio::test]
    async fn script_update_recommendation_calls_add_routing_rule() {
        let agent = MockRoutingAgent::new("agent-1");
        let rec = sample_rec(RecommendationKind::ScriptUpdate);
        apply(&rec, &agent, sample_metrics(), Utc::now()).await.unwrap();
        let calls = agent.recorded_calls().await;
        assert!(calls[0].starts_with("add_routing_rule:"));
    }
}
