use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contracts::{CoreError, CoreResult};
use crate::data_models::performance::{ImpactReport, Improvement, MetricTuple};

/// # NDOC
/// component: `subsystems::analytics::impact`
/// purpose: Tracks one baseline `MetricTuple` per agent and measures the
///   improvement of a current snapshot against it.
/// invariants: `measure_impact` fails with `NoBaseline` until `set_baseline`
///   has run for that agent at least once; on validation the baseline is
///   atomically replaced with the current snapshot.
pub fn compute_improvement(baseline: &MetricTuple, current: &MetricTuple) -> Improvement {
    let conv_imp_pct = pct_change(baseline.conversion_rate, current.conversion_rate);
    let resp_imp_pct = pct_change(current.avg_response_ms, baseline.avg_response_ms);
    let sat_imp_pct = pct_change(baseline.csat, current.csat);
    let overall = 0.4 * conv_imp_pct + 0.3 * resp_imp_pct + 0.3 * sat_imp_pct;
    Improvement {
        conversion_rate: conv_imp_pct,
        response_time: resp_imp_pct,
        satisfaction: sat_imp_pct,
        overall,
    }
}

fn pct_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        0.0
    } else {
        (to - from) / from * 100.0
    }
}

pub struct ImpactTracker {
    baselines: tokio::sync::Mutex<std::collections::HashMap<String, MetricTuple>>,
}

impl ImpactTracker {
    pub fn new() -> Self {
        Self {
            baselines: tokio::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub async fn set_baseline(&self, agent_id: &str, snapshot: MetricTuple) {
        self.baselines.lock().await.insert(agent_id.to_string(), snapshot);
    }

    /// Measures current performance against the stored baseline. Validated
    /// optimizations atomically rotate the baseline to the current snapshot.
    pub async fn measure_impact(
        &self,
        agent_id: &str,
        optimization_id: Uuid,
        current: MetricTuple,
        _at: DateTime<Utc>,
    ) -> CoreResult<ImpactReport> {
        let mut baselines = self.baselines.lock().await;
        let baseline = baselines
            .get(agent_id)
            .copied()
            .ok_or_else(|| CoreError::no_baseline(format!("no baseline set for agent {agent_id}")))?;

        let improvement = compute_improvement(&baseline, &current);
        let validated = improvement.overall > 5.0;
        if validated {
            baselines.insert(agent_id.to_string(), current);
        }

        Ok(ImpactReport {
            agent_id: agent_id.to_string(),
            optimization_id,
            baseline,
            current,
            improvement,
            validated,
        })
    }
}

impl Default for ImpactTracker {
    fn default() -> Self {
        Self::new()
    }
}
