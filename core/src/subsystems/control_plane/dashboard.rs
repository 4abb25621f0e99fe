use chrono::{DateTime, Utc};

use crate::data_models::control_plane::DashboardSnapshot;
use crate::data_models::optimization::OptimizationRecommendation;
use crate::data_models::performance::MetricTuple;

/// Composes a read-only `DashboardSnapshot` from the data each subsystem
/// already tracks; this function owns no state of its own.
pub fn compose(
    current_metrics_by_agent: Vec<(String, MetricTuple)>,
    active_optimizations: Vec<OptimizationRecommendation>,
    recent_alert_summaries: Vec<String>,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> DashboardSnapshot {
    let uptime_seconds = now.signed_duration_since(started_at).num_seconds().max(0) as u64;
    DashboardSnapshot {
        generated_at: now,
        current_metrics_by_agent,
        active_optimizations,
        recent_alert_summaries,
        uptime_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn uptime_is_seconds_since_start() {
        let started_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let now = started_at + chrono::Duration::minutes(90);
        let snapshot = compose(vec![], vec![], vec![], started_at, now);
        assert_eq!(snapshot.uptime_seconds, 5400);
    }
}
