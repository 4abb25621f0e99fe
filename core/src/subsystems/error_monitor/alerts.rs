use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::utils::logger::log_alert_event;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ErrorRate,
    CriticalErrors,
    CircuitBreakerTrips,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertChannelKind {
    Log,
    Email,
    Slack,
    Webhook,
}

impl serde::Serialize for AlertChannelKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = match self {
            AlertChannelKind::Log => "log",
            AlertChannelKind::Email => "email",
            AlertChannelKind::Slack => "slack",
            AlertChannelKind::Webhook => "webhook",
        };
        serializer.serialize_str(s)
    }
}

impl<'de> serde::Deserialize<'de> for AlertChannelKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "log" => Ok(AlertChannelKind::Log),
            "email" => Ok(AlertChannelKind::Email),
            "slack" => Ok(AlertChannelKind::Slack),
            "webhook" => Ok(AlertChannelKind::Webhook),
            other => Err(serde::de::Error::custom(format!("unknown alert channel {other}"))),
        }
    }
}

/// # NDOC
/// component: `subsystems::error_monitor::alerts`
/// purpose: A registered alert destination. Per-channel callback failures
///   never block other channels from receiving the same alert.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    fn kind(&self) -> AlertChannelKind;
    async fn deliver(&self, alert: &Alert) -> Result<(), String>;
}

pub struct LogAlertChannel;

#[async_trait]
impl AlertChannel for LogAlertChannel {
    fn kind(&self) -> AlertChannelKind {
        AlertChannelKind::Log
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), String> {
        log_alert_event(
            &format!("{:?}", alert.kind),
            &format!("{:?}", alert.severity),
            &serde_json::json!({"message": alert.message}),
        );
        Ok(())
    }
}

/// # NDOC
/// component: `subsystems::error_monitor::alerts`
/// purpose: Fans out alerts to every registered channel with a per-kind
///   cooldown, so a sustained condition does not spam every channel on
///   every tick.
pub struct AlertFanout {
    channels: Vec<Box<dyn AlertChannel>>,
    cooldown: chrono::Duration,
    last_fired: Mutex<HashMap<AlertKind, DateTime<Utc>>>,
}

impl AlertFanout {
    pub fn new(channels: Vec<Box<dyn AlertChannel>>, cooldown: chrono::Duration) -> Self {
        Self {
            channels,
            cooldown,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    /// Attempts to raise `alert`. Returns `false` (and does not fan out) if
    /// the alert's kind is still within its cooldown window.
    pub async fn raise(&self, alert: Alert, now: DateTime<Utc>) -> bool {
        {
            let mut last_fired = self.last_fired.lock().await;
            if let Some(last) = last_fired.get(&alert.kind) {
                if now.signed_duration_since(*last) < self.cooldown {
                    return false;
                }
            }
            last_fired.insert(alert.kind, now);
        }
        for channel in &self.channels {
            if let Err(e) = channel.deliver(&alert).await {
                log::warn!(
                    target: "error_monitor",
                    channel = format!("{:?}", channel.kind()).as_str(),
                    error = e.as_str();
                    "alert channel delivery failed"
                );
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingChannel {
        kind: AlertChannelKind,
        count: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl AlertChannel for CountingChannel {
        fn kind(&self) -> AlertChannelKind {
            self.kind
        }

        async fn deliver(&self, _alert: &Alert) -> Result<(), String> {
            self.count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err("channel down".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn make_alert() -> Alert {
        Alert {
            kind: AlertKind::ErrorRate,
            severity: AlertSeverity::Warning,
            message: "error rate high".to_string(),
            raised_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn failing_channel_does_not_block_others() {
        let a_count = Arc::new(AtomicUsize::new(0));
        let b_count = Arc::new(AtomicUsize::new(0));
        let fanout = AlertFanout::new(
            vec![
                Box::new(CountingChannel {
                    kind: AlertChannelKind::Email,
                    count: a_count.clone(),
                    fail: true,
                }),
                Box::new(CountingChannel {
                    kind: AlertChannelKind::Slack,
                    count: b_count.clone(),
                    fail: false,
                }),
            ],
            Duration::minutes(15),
        );
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(fanout.raise(make_alert(), now).await);
        assert_eq!(a_count.load(Ordering::SeqCst), 1);
        assert_eq!(b_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cooldown_suppresses_repeat_alert_of_same_kind() {
        let fanout = AlertFanout::new(vec![Box::new(LogAlertChannel)], Duration::minutes(15));
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert!(fanout.raise(make_alert(), now).await);
        assert!(!fanout.raise(make_alert(), now + Duration::minutes(5)).await);
        assert!(fanout.raise(make_alert(), now + Duration::minutes(16)).await);
    }
}
