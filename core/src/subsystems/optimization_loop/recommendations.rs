use serde_json::json;
use uuid::Uuid;

use crate::data_models::optimization::{
    Implementation, OptimizationRecommendation, Priority, RecommendationKind, ValidationCriteria,
};
use crate::data_models::performance::{
    MetricTuple, PerformanceTrend, ScriptOptimization, TrendDirection, TrendSignificance,
};

const DEFAULT_TESTING_DAYS: u32 = 7;

fn criteria(metrics: Vec<&str>, min_improvement_pct: f64) -> ValidationCriteria {
    ValidationCriteria {
        metrics: metrics.into_iter().map(str::to_string).collect(),
        min_improvement_pct,
        test_days: DEFAULT_TESTING_DAYS,
        significance_threshold: 0.05,
    }
}

/// Synthesizes threshold-based recommendations from one agent's current
/// metrics, per §4.7.1.
pub fn from_metrics(agent_id: &str, metrics: &MetricTuple) -> Vec<OptimizationRecommendation> {
    let mut recs = Vec::new();

    if metrics.conversion_rate < 0.60 {
        recs.push(OptimizationRecommendation {
            id: Uuid::new_v4(),
            kind: RecommendationKind::RoutingRule,
            priority: Priority::High,
            expected_impact_pct: 15.0,
            implementation: Implementation {
                action: "lower_urgency_threshold".to_string(),
                parameters: json!({"agent_id": agent_id}),
                rollback_plan: json!({"action": "restore_urgency_threshold", "agent_id": agent_id}),
                testing_days: DEFAULT_TESTING_DAYS,
            },
            validation_criteria: criteria(vec!["conversion_rate"], 15.0),
            description: "Lower urgency threshold for high-priority routing".to_string(),
            agent_id: agent_id.to_string(),
        });
    }

    if metrics.avg_response_ms > 60_000.0 {
        recs.push(OptimizationRecommendation {
            id: Uuid::new_v4(),
            kind: RecommendationKind::RoutingRule,
            priority: Priority::High,
            expected_impact_pct: 20.0,
            implementation: Implementation {
                action: "prioritize_fast_responders".to_string(),
                parameters: json!({"agent_id": agent_id}),
                rollback_plan: json!({"action": "restore_routing_weights", "agent_id": agent_id}),
                testing_days: DEFAULT_TESTING_DAYS,
            },
            validation_criteria: criteria(vec!["avg_response_ms"], 20.0),
            description: "Prioritize fast-responding agents".to_string(),
            agent_id: agent_id.to_string(),
        });
    }

    if metrics.csat < 4.0 {
        recs.push(OptimizationRecommendation {
            id: Uuid::new_v4(),
            kind: RecommendationKind::ScriptUpdate,
            priority: Priority::Medium,
            expected_impact_pct: 10.0,
            implementation: Implementation {
                action: "review_qualification_phrasing".to_string(),
                parameters: json!({"agent_id": agent_id}),
                rollback_plan: json!({"action": "restore_script", "agent_id": agent_id}),
                testing_days: DEFAULT_TESTING_DAYS,
            },
            validation_criteria: criteria(vec!["csat"], 10.0),
            description: "Review qualification phrasing".to_string(),
            agent_id: agent_id.to_string(),
        });
    }

    if metrics.appointment_booking_rate < 0.30 {
        recs.push(OptimizationRecommendation {
            id: Uuid::new_v4(),
            kind: RecommendationKind::ScriptUpdate,
            priority: Priority::Medium,
            expected_impact_pct: 10.0,
            implementation: Implementation {
                action: "enhance_closing_templates".to_string(),
                parameters: json!({"agent_id": agent_id}),
                rollback_plan: json!({"action": "restore_script", "agent_id": agent_id}),
                testing_days: DEFAULT_TESTING_DAYS,
            },
            validation_criteria: criteria(vec!["appointment_booking_rate"], 10.0),
            description: "Enhance closing templates".to_string(),
            agent_id: agent_id.to_string(),
        });
    }

    recs
}

/// From script analyses: scripts estimated at `>= 20%` improvement yield a
/// high-priority recommendation, `10..20%` yields medium, `< 10%` is
/// discarded.
pub fn from_script_analyses(analyses: &[ScriptOptimization]) -> Vec<OptimizationRecommendation> {
    let mut recs = Vec::new();
    for analysis in analyses {
        let Some(best) = analysis
            .recommendations
            .iter()
            .max_by(|a, b| a.expected_impact_pct.partial_cmp(&b.expected_impact_pct).unwrap())
        else {
            continue;
        };
        let priority = if best.expected_impact_pct >= 20.0 {
            Priority::High
        } else if best.expected_impact_pct >= 10.0 {
            Priority::Medium
        } else {
            continue;
        };
        recs.push(OptimizationRecommendation {
            id: Uuid::new_v4(),
            kind: RecommendationKind::ScriptUpdate,
            priority,
            expected_impact_pct: best.expected_impact_pct,
            implementation: Implementation {
                action: "update_script".to_string(),
                parameters: json!({"script_id": analysis.script_id, "change": best.text}),
                rollback_plan: json!({"action": "restore_script", "script_id": analysis.script_id}),
                testing_days: DEFAULT_TESTING_DAYS,
            },
            validation_criteria: criteria(vec!["conversion_rate"], best.expected_impact_pct),
            description: best.text.clone(),
            agent_id: String::new(),
        });
    }
    recs
}

/// From trends: any metric declining with medium-or-high significance
/// yields a `timing_adjustment` recommendation naming the metric and the
/// decline percent.
pub fn from_trends(trends: &[PerformanceTrend]) -> Vec<OptimizationRecommendation> {
    trends
        .iter()
        .filter(|t| {
            t.trend == TrendDirection::Decreasing
                && matches!(t.significance, TrendSignificance::Medium | TrendSignificance::High)
        })
        .map(|t| OptimizationRecommendation {
            id: Uuid::new_v4(),
            kind: RecommendationKind::TimingAdjustment,
            priority: Priority::Medium,
            expected_impact_pct: t.change_percent.abs(),
            implementation: Implementation {
                action: "adjust_sequence_timing".to_string(),
                parameters: json!({"metric": t.metric}),
                rollback_plan: json!({"action": "restore_sequence_timing", "metric": t.metric}),
                testing_days: DEFAULT_TESTING_DAYS,
            },
            validation_criteria: criteria(vec![t.metric.as_str()], t.change_percent.abs()),
            description: format!("{} declining {:.1}%", t.metric, t.change_percent.abs()),
            agent_id: String::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::analytics::trends::analyze_trend;
    use chrono::Utc;

    #[test]
    fn s6_low_conversion_and_slow_response_both_yield_high_priority() {
        let metrics = MetricTuple {
            total_interactions: 100,
            conversion_rate: 0.45,
            avg_response_ms: 85_000.0,
            appointment_booking_rate: 0.5,
            csat: 4.5,
        };
        let recs = from_metrics("agent-1", &metrics);
        assert_eq!(recs.len(), 2);
        assert!(recs.iter().all(|r| r.priority == Priority::High));
    }

    #[test]
    fn script_below_ten_percent_is_discarded() {
        let analysis = ScriptOptimization {
            script_id: "script-1".to_string(),
            current_metrics: crate::data_models::performance::ScriptMetric {
                script_id: "script-1".to_string(),
                conversion_rate: 0.4,
                sample_size: 100,
            },
            recommendations: vec![crate::data_models::performance::Suggestion {
                text: "minor tweak".to_string(),
                expected_impact_pct: 5.0,
            }],
        };
        assert!(from_script_analyses(&[analysis]).is_empty());
    }

    #[test]
    fn decreasing_trend_with_high_significance_yields_timing_adjustment() {
        let now = Utc::now();
        let trend = analyze_trend(
            "conversion_rate",
            vec![
                crate::data_models::performance::TrendDataPoint { timestamp: now, value: 100.0 },
                crate::data_models::performance::TrendDataPoint { timestamp: now, value: 70.0 },
            ],
        );
        let recs = from_trends(&[trend]);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::TimingAdjustment);
    }
}
