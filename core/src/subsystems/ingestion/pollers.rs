use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::contracts::CoreResult;
use crate::data_models::lead::LeadSource;
use crate::store::Store;
use crate::subsystems::error_monitor::monitor::ErrorMonitor;
use crate::subsystems::ingestion::pipeline::IngestionPipeline;
use crate::utils::clock::Clock;
use crate::utils::logger::log_ingestion_event;

const FIRST_RUN_LOOKBACK: chrono::Duration = chrono::Duration::minutes(60);

/// # NDOC
/// component: `subsystems::ingestion::pollers`
/// purpose: One page of externally-fetched raw leads plus the message ids
///   that must be marked processed so a later poll does not refetch them.
pub struct FetchedPage {
    pub raw_leads: Vec<Value>,
    pub message_ids: Vec<String>,
}

/// A pull-based lead source. Implementors fetch everything observed since
/// `since`, without marking anything processed — marking is the poller's
/// job after the pipeline has consumed the page.
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn source(&self) -> LeadSource;
    fn resource_name(&self) -> &str;
    async fn fetch_since(&self, since: DateTime<Utc>) -> CoreResult<FetchedPage>;
    async fn mark_processed(&self, message_ids: &[String]) -> CoreResult<()>;
}

/// # NDOC
/// component: `subsystems::ingestion::pollers`
/// purpose: Drives one `SourceClient` on a fixed interval: fetch since the
///   last watermark, feed the ingestion pipeline, advance the watermark,
///   mark messages processed. Repeated failures suspend polling for that
///   source through the shared circuit breaker registry.
pub struct SourcePoller<'a> {
    client: Arc<dyn SourceClient>,
    store: &'a dyn Store,
    error_monitor: &'a ErrorMonitor,
    clock: Arc<dyn Clock>,
    watermark: Mutex<Option<DateTime<Utc>>>,
    seen_message_ids: Mutex<HashSet<String>>,
}

impl<'a> SourcePoller<'a> {
    pub fn new(
        client: Arc<dyn SourceClient>,
        store: &'a dyn Store,
        error_monitor: &'a ErrorMonitor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            store,
            error_monitor,
            clock,
            watermark: Mutex::new(None),
            seen_message_ids: Mutex::new(HashSet::new()),
        }
    }

    /// Runs a single poll cycle. Returns the number of raw leads handed to
    /// the pipeline, or `None` if the source's breaker is currently open.
    pub async fn poll_once(&self) -> Option<usize> {
        let resource = self.client.resource_name().to_string();
        if !self.error_monitor.breakers.allow_call(&resource).await {
            log_ingestion_event(
                self.client.resource_name(),
                "poll_suspended",
                &serde_json::json!({"reason": "circuit_breaker_open"}),
            );
            return None;
        }

        let now = self.clock.now();
        let since = {
            let mut watermark = self.watermark.lock().await;
            let effective = watermark.unwrap_or(now - FIRST_RUN_LOOKBACK);
            *watermark = Some(now);
            effective
        };

        let page = match self.client.fetch_since(since).await {
            Ok(p) => p,
            Err(e) => {
                self.error_monitor.record(&resource, &e).await;
                log_ingestion_event(
                    self.client.resource_name(),
                    "fetch_failed",
                    &serde_json::json!({"error": e.message}),
                );
                return None;
            }
        };

        let unseen: Vec<Value> = {
            let mut seen = self.seen_message_ids.lock().await;
            let mut unseen = Vec::new();
            for (raw, id) in page.raw_leads.iter().zip(page.message_ids.iter()) {
                if !seen.contains(id) {
                    seen.insert(id.clone());
                    unseen.push(raw.clone());
                }
            }
            unseen
        };

        if unseen.is_empty() {
            self.error_monitor.record_success(&resource).await;
            return Some(0);
        }

        let pipeline = IngestionPipeline::new(self.store);
        let source = self.client.source();
        let payloads: Vec<(Value, LeadSource)> = unseen.into_iter().map(|raw| (raw, source)).collect();
        let results = pipeline.process_batch(&payloads, now).await;

        if let Err(e) = self.client.mark_processed(&page.message_ids).await {
            self.error_monitor.record(&resource, &e).await;
        } else {
            self.error_monitor.record_success(&resource).await;
        }

        log_ingestion_event(
            self.client.resource_name(),
            "poll_completed",
            &serde_json::json!({
                "fetched": results.len(),
                "succeeded": results.iter().filter(|r| r.success).count(),
            }),
        );

        Some(results.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::CoreError;
    use crate::store::memory_store::InMemoryStore;
    use crate::subsystems::error_monitor::alerts::{AlertFanout, LogAlertChannel};
    use crate::subsystems::error_monitor::monitor::ErrorMonitorConfig;
    use crate::utils::clock::FrozenClock;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubClient {
        source: LeadSource,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SourceClient for StubClient {
        fn source(&self) -> LeadSource {
            self.source
        }

        fn resource_name(&self) -> &str {
            "stub.poll"
        }

        async fn fetch_since(&self, _since: DateTime<Utc>) -> CoreResult<FetchedPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CoreError::external_unavailable("source down"));
            }
            Ok(FetchedPage {
                raw_leads: vec![json!({"formName": "Contact", "name": "Polled Lead"})],
                message_ids: vec!["msg-1".to_string()],
            })
        }

        async fn mark_processed(&self, _message_ids: &[String]) -> CoreResult<()> {
            Ok(())
        }
    }

    fn make_monitor(clock: Arc<FrozenClock>) -> ErrorMonitor {
        let fanout = AlertFanout::new(vec![Box::new(LogAlertChannel)], chrono::Duration::minutes(15));
        ErrorMonitor::new(ErrorMonitorConfig::default(), fanout, clock)
    }

    #[tokio::test]
    async fn fetched_lead_is_ingested_and_marked_processed() {
        let clock = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let store = InMemoryStore::new();
        let monitor = make_monitor(clock.clone());
        let client = Arc::new(StubClient {
            source: LeadSource::Gmail,
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let poller = SourcePoller::new(client, &store, &monitor, clock);
        let count = poller.poll_once().await;
        assert_eq!(count, Some(1));
        let leads = store.query_leads(crate::store::LeadFilter::default()).await.unwrap();
        assert_eq!(leads.len(), 1);
    }

    #[tokio::test]
    async fn second_poll_skips_already_seen_message() {
        let clock = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let store = InMemoryStore::new();
        let monitor = make_monitor(clock.clone());
        let client = Arc::new(StubClient {
            source: LeadSource::Gmail,
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let poller = SourcePoller::new(client, &store, &monitor, clock);
        poller.poll_once().await;
        let second = poller.poll_once().await;
        assert_eq!(second, Some(0));
    }

    #[tokio::test]
    async fn repeated_failures_open_breaker_and_suspend_polling() {
        let clock = Arc::new(FrozenClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()));
        let store = InMemoryStore::new();
        let monitor = make_monitor(clock.clone());
        let client = Arc::new(StubClient {
            source: LeadSource::Gmail,
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let poller = SourcePoller::new(client.clone(), &store, &monitor, clock);
        for _ in 0..5 {
            poller.poll_once().await;
        }
        let suspended = poller.poll_once().await;
        assert_eq!(suspended, None);
        assert_eq!(client.calls.load(Ordering::SeqCst), 5);
    }
}
