use chrono::{DateTime, Utc};

use crate::store::Store;
use crate::subsystems::error_monitor::monitor::ErrorMonitor;
use crate::subsystems::scheduler::sequence::{PersonalizationContext, SequenceTicker};

/// # NDOC
/// component: `subsystems::scheduler::dispatcher`
/// purpose: The tick-dispatcher concurrency unit described in §5: pulls due
///   sequences from the store, fires each one, and persists the result.
///   One sequence's failure never blocks another's tick.
pub struct TickDispatcher<'a> {
    store: &'a dyn Store,
    ticker: SequenceTicker<'a>,
    error_monitor: &'a ErrorMonitor,
}

impl<'a> TickDispatcher<'a> {
    pub fn new(
        store: &'a dyn Store,
        ticker: SequenceTicker<'a>,
        error_monitor: &'a ErrorMonitor,
    ) -> Self {
        Self {
            store,
            ticker,
            error_monitor,
        }
    }

    /// Fires every sequence due as of `now`. Returns the count of sequences
    /// that fired successfully.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> usize {
        let due = match self.store.list_due_sequences(now).await {
            Ok(due) => due,
            Err(e) => {
                self.error_monitor.record("scheduler.store", &e).await;
                return 0;
            }
        };

        let mut fired = 0;
        for mut sequence in due {
            let lead = match self.store.get_lead(sequence.lead_id).await {
                Ok(Some(lead)) => lead,
                Ok(None) => continue,
                Err(e) => {
                    self.error_monitor.record("scheduler.store", &e).await;
                    continue;
                }
            };
            let destination = match lead.contact.preferred_channel {
                crate::data_models::lead::ChannelKind::Email => lead.contact.email.clone(),
                _ => lead.contact.phone.clone(),
            };
            let Some(destination) = destination else {
                continue;
            };
            let ctx = PersonalizationContext {
                lead_name: lead.contact.name.clone(),
                ..Default::default()
            };

            match self.ticker.fire(&mut sequence, &destination, &ctx, now).await {
                Ok(true) => {
                    self.error_monitor.record_success("scheduler.sequence").await;
                    fired += 1;
                }
                Ok(false) => {}
                Err(e) => self.error_monitor.record("scheduler.sequence", &e).await,
            }

            if let Err(e) = self.store.upsert_sequence(sequence).await {
                self.error_monitor.record("scheduler.store", &e).await;
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::lead::{ChannelKind, ContactInfo, Lead, LeadSource, LeadStatus, LeadType, Qualification};
    use crate::data_models::sequence::{OutboundSequence, SequenceKind, SequenceStatus};
    use crate::external::message_sender::{MessageSender, SendOutcome};
    use crate::store::memory_store::InMemoryStore;
    use crate::subsystems::error_monitor::alerts::AlertFanout;
    use crate::subsystems::error_monitor::monitor::ErrorMonitorConfig;
    use crate::utils::clock::{Clock, SystemClock};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use uuid::Uuid;

    struct AlwaysDelivers;

    #[async_trait]
    impl MessageSender for AlwaysDelivers {
        fn name(&self) -> &'static str {
            "test"
        }
        fn is_available(&self) -> bool {
            true
        }
        async fn send(
            &self,
            _channel: ChannelKind,
            _destination: &str,
            _payload: &str,
        ) -> Result<SendOutcome, crate::contracts::CoreError> {
            Ok(SendOutcome {
                delivered: true,
                message_id: Some("m1".to_string()),
                failure_reason: None,
            })
        }
    }

    #[tokio::test]
    async fn due_sequence_is_fired_and_persisted() {
        let store = InMemoryStore::new();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let now = clock.now();

        let lead = Lead {
            id: Uuid::new_v4(),
            source: LeadSource::Website,
            contact: ContactInfo {
                name: "Jane".to_string(),
                email: None,
                phone: Some("+15551234567".to_string()),
                preferred_channel: ChannelKind::Sms,
                timezone: "UTC".to_string(),
            },
            lead_type: LeadType::Warm,
            urgency: 5,
            intent_signals: BTreeSet::new(),
            qualification: Qualification::default(),
            status: LeadStatus::Contacted,
            assigned_agent: None,
            created_at: now,
            updated_at: now,
        };
        store.upsert_lead(lead.clone()).await.unwrap();

        let sequence = OutboundSequence {
            id: Uuid::new_v4(),
            lead_id: lead.id,
            campaign_id: Uuid::new_v4(),
            kind: SequenceKind::Cold,
            current_step: 0,
            total_steps: 3,
            next_fire_at: Some(now - chrono::Duration::minutes(1)),
            status: SequenceStatus::Active,
            interaction_ids: vec![],
        };
        store.upsert_sequence(sequence.clone()).await.unwrap();

        let sender = AlwaysDelivers;
        let ticker = SequenceTicker::new(&sender);
        let fanout = AlertFanout::new(vec![], chrono::Duration::minutes(15));
        let monitor = ErrorMonitor::new(ErrorMonitorConfig::default(), fanout, clock.clone());
        let dispatcher = TickDispatcher::new(&store, ticker, &monitor);

        let fired = dispatcher.run_tick(now).await;
        assert_eq!(fired, 1);

        let updated = store.get_sequence(sequence.id).await.unwrap().unwrap();
        assert_eq!(updated.current_step, 1);
    }
}
