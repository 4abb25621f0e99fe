use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contracts::CoreResult;
use crate::data_models::performance::{
    ImpactReport, Insight, MetricTuple, Period, PerformanceSnapshot, PerformanceTrend,
    ScriptMetric, ScriptOptimization, Suggestion, TrendDataPoint,
};
use crate::store::Store;
use crate::subsystems::analytics::impact::ImpactTracker;
use crate::subsystems::analytics::insights::generate_intelligence_report;
use crate::subsystems::analytics::metrics::compute_metrics;
use crate::subsystems::analytics::scripts::analyze_script_performance;
use crate::subsystems::analytics::trends::analyze_trend;

/// # NDOC
/// component: `subsystems::analytics::engine`
/// purpose: The analytics engine's public contract (§4.5 of the governing
///   specification): collects performance snapshots, analyzes scripts,
///   generates intelligence reports, analyzes trends, and tracks
///   baseline-vs-current impact per agent.
pub struct AnalyticsEngine<'a> {
    store: &'a dyn Store,
    impact: ImpactTracker,
}

impl<'a> AnalyticsEngine<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            impact: ImpactTracker::new(),
        }
    }

    /// Aggregates interactions for `agent_id` within `period` into a
    /// `PerformanceSnapshot` and persists it.
    pub async fn collect_performance(
        &self,
        agent_id: &str,
        period: Period,
    ) -> CoreResult<PerformanceSnapshot> {
        let interactions = self.store.query_interactions_for_agent(agent_id, period).await?;
        let metrics = compute_metrics(&interactions);
        let snapshot = PerformanceSnapshot {
            agent_id: agent_id.to_string(),
            period,
            metrics,
            script_metrics: Vec::new(),
            suggestions: Vec::new(),
        };
        self.store.upsert_performance(snapshot.clone()).await?;
        Ok(snapshot)
    }

    pub fn analyze_script_performance(
        &self,
        scripts: Vec<(ScriptMetric, Vec<Suggestion>)>,
    ) -> Vec<ScriptOptimization> {
        analyze_script_performance(scripts)
    }

    pub fn analyze_trend(&self, metric: &str, data_points: Vec<TrendDataPoint>) -> PerformanceTrend {
        analyze_trend(metric, data_points)
    }

    pub fn generate_intelligence_report(
        &self,
        agent_id: &str,
        metrics: &MetricTuple,
        scripts: &[ScriptOptimization],
        trends: &[PerformanceTrend],
        now: DateTime<Utc>,
    ) -> Vec<Insight> {
        generate_intelligence_report(agent_id, metrics, scripts, trends, now)
    }

    pub async fn set_baseline(&self, agent_id: &str, snapshot: MetricTuple) {
        self.impact.set_baseline(agent_id, snapshot).await;
    }

    pub async fn measure_impact(
        &self,
        agent_id: &str,
        optimization_id: Uuid,
        current: MetricTuple,
        now: DateTime<Utc>,
    ) -> CoreResult<ImpactReport> {
        self.impact.measure_impact(agent_id, optimization_id, current, now).await
    }
}
