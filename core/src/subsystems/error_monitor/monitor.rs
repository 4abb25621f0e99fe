use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::contracts::CoreError;
use crate::subsystems::error_monitor::alerts::{Alert, AlertFanout, AlertKind, AlertSeverity};
use crate::subsystems::error_monitor::circuit_breaker::CircuitBreakerRegistry;
use crate::subsystems::error_monitor::classification::{classify, ClassifiedError, Severity};
use crate::utils::clock::Clock;

const RETENTION: chrono::Duration = chrono::Duration::hours(24);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    Healthy,
    Degraded,
    Critical,
}

pub struct ErrorMonitorConfig {
    pub error_rate_threshold_per_min: f64,
    pub critical_per_hour_threshold: u32,
    pub cb_trips_per_hour_threshold: u32,
    pub cooldown: chrono::Duration,
    pub circuit_breaker_failure_threshold: u32,
    pub circuit_breaker_backoff: chrono::Duration,
}

impl Default for ErrorMonitorConfig {
    fn default() -> Self {
        Self {
            error_rate_threshold_per_min: 10.0,
            critical_per_hour_threshold: 5,
            cb_trips_per_hour_threshold: 3,
            cooldown: chrono::Duration::minutes(15),
            circuit_breaker_failure_threshold: 5,
            circuit_breaker_backoff: chrono::Duration::minutes(5),
        }
    }
}

/// # NDOC
/// component: `subsystems::error_monitor::monitor`
/// purpose: Central error classification, circuit breaker, and alerting
///   facade every other subsystem reports observed failures to.
pub struct ErrorMonitor {
    window: Mutex<VecDeque<ClassifiedError>>,
    breaker_trips: Mutex<VecDeque<DateTime<Utc>>>,
    pub breakers: CircuitBreakerRegistry,
    fanout: AlertFanout,
    config: ErrorMonitorConfig,
    clock: Arc<dyn Clock>,
}

impl ErrorMonitor {
    pub fn new(config: ErrorMonitorConfig, fanout: AlertFanout, clock: Arc<dyn Clock>) -> Self {
        let breakers = CircuitBreakerRegistry::new(
            config.circuit_breaker_failure_threshold,
            config.circuit_breaker_backoff,
            clock.clone(),
        );
        Self {
            window: Mutex::new(VecDeque::new()),
            breaker_trips: Mutex::new(VecDeque::new()),
            breakers,
            fanout,
            config,
            clock,
        }
    }

    /// Records an error against `resource`, classifying it, trimming the
    /// retention window, updating the resource's circuit breaker, and
    /// evaluating alert thresholds.
    pub async fn record(&self, resource: &str, error: &CoreError) {
        let now = self.clock.now();
        let classified = classify(error, now);

        {
            let mut window = self.window.lock().await;
            window.push_back(classified.clone());
            self.trim_window(&mut window, now);
        }

        if error.retryable {
            let tripped = self.breakers.record_failure(resource).await;
            if tripped {
                let mut trips = self.breaker_trips.lock().await;
                trips.push_back(now);
                self.trim_trips(&mut trips, now);
            }
        }

        self.evaluate_thresholds(now).await;
    }

    pub async fn record_success(&self, resource: &str) {
        self.breakers.record_success(resource).await;
    }

    fn trim_window(&self, window: &mut VecDeque<ClassifiedError>, now: DateTime<Utc>) {
        while let Some(front) = window.front() {
            if now.signed_duration_since(front.occurred_at) > RETENTION {
                window.pop_front();
            } else {
                break;
            }
        }
    }

    fn trim_trips(&self, trips: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>) {
        while let Some(front) = trips.front() {
            if now.signed_duration_since(*front) > chrono::Duration::hours(1) {
                trips.pop_front();
            } else {
                break;
            }
        }
    }

    async fn error_rate_per_min(&self, now: DateTime<Utc>) -> f64 {
        let window = self.window.lock().await;
        let one_min_ago = now - chrono::Duration::minutes(1);
        window.iter().filter(|e| e.occurred_at >= one_min_ago).count() as f64
    }

    async fn critical_errors_last_hour(&self, now: DateTime<Utc>) -> u32 {
        let window = self.window.lock().await;
        let one_hour_ago = now - chrono::Duration::hours(1);
        window
            .iter()
            .filter(|e| e.occurred_at >= one_hour_ago && e.severity == Severity::Critical)
            .count() as u32
    }

    async fn breaker_trips_last_hour(&self) -> u32 {
        self.breaker_trips.lock().await.len() as u32
    }

    async fn evaluate_thresholds(&self, now: DateTime<Utc>) {
        let error_rate = self.error_rate_per_min(now).await;
        if error_rate >= self.config.error_rate_threshold_per_min {
            self.fanout
                .raise(
                    Alert {
                        kind: AlertKind::ErrorRate,
                        severity: AlertSeverity::Warning,
                        message: format!("error rate {error_rate}/min exceeds threshold"),
                        raised_at: now,
                    },
                    now,
                )
                .await;
        }

        let critical_errors = self.critical_errors_last_hour(now).await;
        if critical_errors >= self.config.critical_per_hour_threshold {
            self.fanout
                .raise(
                    Alert {
                        kind: AlertKind::CriticalErrors,
                        severity: AlertSeverity::Critical,
                        message: format!("{critical_errors} critical errors in the last hour"),
                        raised_at: now,
                    },
                    now,
                )
                .await;
        }

        let trips = self.breaker_trips_last_hour().await;
        if trips >= self.config.cb_trips_per_hour_threshold {
            self.fanout
                .raise(
                    Alert {
                        kind: AlertKind::CircuitBreakerTrips,
                        severity: AlertSeverity::Error,
                        message: format!("{trips} circuit breaker trips in the last hour"),
                        raised_at: now,
                    },
                    now,
                )
                .await;
        }
    }

    /// System status is a derived function of recent critical errors, the
    /// current error rate, and the number of open breakers.
    pub async fn system_status(&self) -> SystemStatus {
        let now = self.clock.now();
        let critical_errors = self.critical_errors_last_hour(now).await;
        let open_breakers = self.breakers.open_breaker_count().await;
        let error_rate = self.error_rate_per_min(now).await;

        if critical_errors as u32 >= self.config.critical_per_hour_threshold || open_breakers >= 5 {
            SystemStatus::Critical
        } else if error_rate >= self.config.error_rate_threshold_per_min || open_breakers >= 2 {
            SystemStatus::Degraded
        } else {
            SystemStatus::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystems::error_monitor::alerts::LogAlertChannel;
    use crate::utils::clock::FrozenClock;
    use chrono::TimeZone;

    fn make_monitor(clock: Arc<FrozenClock>) -> ErrorMonitor {
        let fanout = AlertFanout::new(vec![Box::new(LogAlertChannel)], chrono::Duration::minutes(15));
        ErrorMonitor::new(ErrorMonitorConfig::default(), fanout, clock)
    }

    #[tokio::test]
    async fn healthy_by_default() {
        let clock = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let monitor = make_monitor(clock);
        assert_eq!(monitor.system_status().await, SystemStatus::Healthy);
    }

    #[tokio::test]
    async fn critical_status_after_enough_critical_errors() {
        let clock = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let monitor = make_monitor(clock);
        for _ in 0..5 {
            monitor
                .record("store.write", &CoreError::integrity("tx aborted"))
                .await;
        }
        assert_eq!(monitor.system_status().await, SystemStatus::Critical);
    }

    #[tokio::test]
    async fn breaker_opens_and_escalates_after_repeated_retryable_failures() {
        let clock = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let monitor = make_monitor(clock);
        for _ in 0..5 {
            monitor
                .record("gmail.poll", &CoreError::external_unavailable("timeout"))
                .await;
        }
        assert!(!monitor.breakers.allow_call("gmail.poll").await);
    }
}
