use chrono::{DateTime, Utc};
use serde_json::json;

use crate::data_models::performance::{
    Insight, InsightKind, MetricTuple, PerformanceTrend, ScriptOptimization,
};

/// Produces one insight per non-empty input collection, each carrying at
/// least one recommendation, non-empty data, and `generated_at = now`.
/// Every returned insight satisfies the freshness invariant at the moment
/// it is produced.
pub fn generate_intelligence_report(
    agent_id: &str,
    metrics: &MetricTuple,
    scripts: &[ScriptOptimization],
    trends: &[PerformanceTrend],
    now: DateTime<Utc>,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    insights.push(Insight {
        kind: InsightKind::Performance,
        actionable: true,
        recommendations: vec![format!(
            "agent {agent_id} conversion rate is {:.1}%",
            metrics.conversion_rate * 100.0
        )],
        data: json!({"agent_id": agent_id, "metrics": metrics}),
        generated_at: now,
    });

    for script in scripts {
        if script.recommendations.is_empty() {
            continue;
        }
        insights.push(Insight {
            kind: InsightKind::Script,
            actionable: true,
            recommendations: script.recommendations.iter().map(|s| s.text.clone()).collect(),
            data: json!({"script_id": script.script_id, "current_metrics": script.current_metrics}),
            generated_at: now,
        });
    }

    for trend in trends {
        insights.push(Insight {
            kind: InsightKind::Trend,
            actionable: true,
            recommendations: vec![format!(
                "{} is {:?} ({:?} significance, {:.1}% change)",
                trend.metric, trend.trend, trend.significance, trend.change_percent
            )],
            data: json!({"trend": trend}),
            generated_at: now,
        });
    }

    insights.push(Insight {
        kind: InsightKind::Optimization,
        actionable: true,
        recommendations: vec!["review active optimizations for validation eligibility".to_string()],
        data: json!({"agent_id": agent_id}),
        generated_at: now,
    });

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::performance::{ScriptMetric, Suggestion, TrendDataPoint};
    use crate::subsystems::analytics::trends::analyze_trend;

    #[test]
    fn report_contains_all_four_insight_kinds_and_passes_freshness() {
        let now = Utc::now();
        let metrics = MetricTuple {
            total_interactions: 50,
            conversion_rate: 0.55,
            avg_response_ms: 30_000.0,
            appointment_booking_rate: 0.25,
            csat: 3.8,
        };
        let scripts = vec![ScriptOptimization {
            script_id: "script-1".to_string(),
            current_metrics: ScriptMetric {
                script_id: "script-1".to_string(),
                conversion_rate: 0.4,
                sample_size: 100,
            },
            recommendations: vec![Suggestion {
                text: "add urgency".to_string(),
                expected_impact_pct: 20.0,
            }],
        }];
        let trend = analyze_trend(
            "conversion_rate",
            vec![
                TrendDataPoint { timestamp: now, value: 0.5 },
                TrendDataPoint { timestamp: now, value: 0.4 },
            ],
        );
        let insights = generate_intelligence_report("agent-1", &metrics, &scripts, &[trend], now);

        let kinds: std::collections::HashSet<InsightKind> = insights.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&InsightKind::Performance));
        assert!(kinds.contains(&InsightKind::Script));
        assert!(kinds.contains(&InsightKind::Trend));
        assert!(kinds.contains(&InsightKind::Optimization));

        for insight in &insights {
            assert!(insight.validate(now).is_ok());
        }
    }
}
