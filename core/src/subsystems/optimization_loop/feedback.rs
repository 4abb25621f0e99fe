use chrono::{DateTime, Utc};

use crate::data_models::feedback::OptimizationFeedback;
use crate::data_models::performance::{MetricTuple, Period, PerformanceTrend, ScriptOptimization};
use crate::subsystems::analytics::engine::AnalyticsEngine;

/// Collects the cross-section of analytics data one optimization cycle
/// reasons over. Any sub-collection that fails is logged and skipped — the
/// cycle continues with whatever succeeded.
pub async fn collect_feedback(
    engine: &AnalyticsEngine<'_>,
    agent_ids: &[String],
    period: Period,
    script_analyses: Vec<ScriptOptimization>,
    trends: Vec<PerformanceTrend>,
    now: DateTime<Utc>,
) -> OptimizationFeedback {
    let mut current_metrics_by_agent: Vec<(String, MetricTuple)> = Vec::new();
    let mut insights = Vec::new();

    for agent_id in agent_ids {
        match engine.collect_performance(agent_id, period).await {
            Ok(snapshot) => {
                let agent_insights =
                    engine.generate_intelligence_report(agent_id, &snapshot.metrics, &script_analyses, &trends, now);
                insights.extend(agent_insights);
                current_metrics_by_agent.push((agent_id.clone(), snapshot.metrics));
            }
            Err(e) => {
                log::warn!(
                    target: "optimization_loop",
                    agent_id = agent_id.as_str(),
                    error = e.message.as_str();
                    "failed to collect performance for agent, skipping"
                );
            }
        }
    }

    OptimizationFeedback {
        collected_at: now,
        insights,
        current_metrics_by_agent,
        script_analyses,
        trends,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory_store::InMemoryStore;
    use chrono::TimeZone;

    #[tokio::test]
    async fn collect_feedback_skips_nothing_when_all_agents_succeed() {
        let store = InMemoryStore::new();
        let engine = AnalyticsEngine::new(&store);
        let period = Period {
            start: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap(),
        };
        let feedback = collect_feedback(
            &engine,
            &["agent-1".to_string(), "agent-2".to_string()],
            period,
            vec![],
            vec![],
            Utc::now(),
        )
        .await;
        assert_eq!(feedback.current_metrics_by_agent.len(), 2);
    }
}
