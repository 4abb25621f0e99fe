use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::contracts::CoreError;
use crate::data_models::audit::AuditLogEntry;
use crate::data_models::interaction::Interaction;
use crate::data_models::lead::Lead;
use crate::data_models::optimization::OptimizationResult;
use crate::data_models::performance::{PerformanceSnapshot, Period};
use crate::data_models::sequence::{OutboundSequence, SequenceStatus};
use crate::store::{LeadFilter, Store};
use crate::utils::clock::{Clock, SystemClock};

#[derive(Default)]
struct Tables {
    leads: HashMap<Uuid, Lead>,
    interactions: HashMap<Uuid, Interaction>,
    performance: HashMap<(String, DateTime<Utc>, DateTime<Utc>), PerformanceSnapshot>,
    audit_log: Vec<AuditLogEntry>,
    optimization_results: HashMap<Uuid, OptimizationResult>,
    sequences: HashMap<Uuid, OutboundSequence>,
}

/// # NDOC
/// component: `store::memory_store`
/// purpose: In-process reference implementation of the `Store` contract,
///   suitable for tests and single-node operation. A real deployment
///   substitutes a database-backed implementation without touching the
///   rest of the crate.
/// invariants:
///   - All mutations to a single lead are serialized via the per-lead lock
///     table, never a single global lock — a write to lead A never blocks
///     behind a write to lead B.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    lead_locks: AsyncMutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            lead_locks: AsyncMutex::new(HashMap::new()),
            clock,
        }
    }

    async fn lock_for_lead(&self, lead_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut locks = self.lead_locks.lock().await;
        locks
            .entry(lead_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables.leads.get(&id).cloned())
    }

    async fn upsert_lead(&self, lead: Lead) -> Result<(), CoreError> {
        let lock = self.lock_for_lead(lead.id).await;
        let _guard = lock.lock().await;
        let mut tables = self.tables.write().expect("store lock poisoned");
        tables.leads.insert(lead.id, lead);
        Ok(())
    }

    async fn query_leads(&self, filter: LeadFilter) -> Result<Vec<Lead>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        let leads = tables
            .leads
            .values()
            .filter(|lead| filter.status.map_or(true, |s| lead.status == s))
            .filter(|lead| filter.source.map_or(true, |s| lead.source == s))
            .filter(|lead| {
                filter
                    .assigned_agent
                    .as_ref()
                    .map_or(true, |agent| lead.assigned_agent.as_deref() == Some(agent))
            })
            .cloned()
            .collect();
        Ok(leads)
    }

    async fn append_interaction(
        &self,
        interaction: Interaction,
        audit_actor: &str,
    ) -> Result<(), CoreError> {
        let lock = self.lock_for_lead(interaction.lead_id).await;
        let _guard = lock.lock().await;
        let audit_entry = AuditLogEntry {
            id: Uuid::new_v4(),
            entity_type: "interaction".to_string(),
            entity_id: interaction.id,
            action: crate::data_models::audit::AuditAction::Insert,
            changes: serde_json::to_value(&interaction)?,
            actor: audit_actor.to_string(),
            timestamp: self.clock.now(),
            metadata: serde_json::json!({}),
        };
        let mut tables = self.tables.write().expect("store lock poisoned");
        tables.interactions.insert(interaction.id, interaction);
        tables.audit_log.push(audit_entry);
        Ok(())
    }

    async fn query_interactions_for_agent(
        &self,
        agent_id: &str,
        period: Period,
    ) -> Result<Vec<Interaction>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables
            .interactions
            .values()
            .filter(|i| i.agent_id == agent_id && period.contains(i.timestamp))
            .cloned()
            .collect())
    }

    async fn query_interactions_for_lead(&self, lead_id: Uuid) -> Result<Vec<Interaction>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables
            .interactions
            .values()
            .filter(|i| i.lead_id == lead_id)
            .cloned()
            .collect())
    }

    async fn upsert_performance(&self, snapshot: PerformanceSnapshot) -> Result<(), CoreError> {
        snapshot.validate()?;
        let mut tables = self.tables.write().expect("store lock poisoned");
        let key = (
            snapshot.agent_id.clone(),
            snapshot.period.start,
            snapshot.period.end,
        );
        tables.performance.insert(key, snapshot);
        Ok(())
    }

    async fn get_performance(
        &self,
        agent_id: &str,
        period: Period,
    ) -> Result<Option<PerformanceSnapshot>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        let key = (agent_id.to_string(), period.start, period.end);
        Ok(tables.performance.get(&key).cloned())
    }

    async fn append_audit(&self, entry: AuditLogEntry) -> Result<(), CoreError> {
        let mut tables = self.tables.write().expect("store lock poisoned");
        tables.audit_log.push(entry);
        Ok(())
    }

    async fn query_audit_for_entity(&self, entity_id: Uuid) -> Result<Vec<AuditLogEntry>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables
            .audit_log
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect())
    }

    async fn upsert_optimization_result(&self, result: OptimizationResult) -> Result<(), CoreError> {
        let mut tables = self.tables.write().expect("store lock poisoned");
        tables.optimization_results.insert(result.recommendation_id, result);
        Ok(())
    }

    async fn get_optimization_result(
        &self,
        recommendation_id: Uuid,
    ) -> Result<Option<OptimizationResult>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables.optimization_results.get(&recommendation_id).cloned())
    }

    async fn list_pending_optimization_results(&self) -> Result<Vec<OptimizationResult>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables
            .optimization_results
            .values()
            .filter(|r| r.is_pending())
            .cloned()
            .collect())
    }

    async fn upsert_sequence(&self, sequence: OutboundSequence) -> Result<(), CoreError> {
        sequence.validate()?;
        let mut tables = self.tables.write().expect("store lock poisoned");
        tables.sequences.insert(sequence.id, sequence);
        Ok(())
    }

    async fn get_sequence(&self, id: Uuid) -> Result<Option<OutboundSequence>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables.sequences.get(&id).cloned())
    }

    async fn list_due_sequences(&self, as_of: DateTime<Utc>) -> Result<Vec<OutboundSequence>, CoreError> {
        let tables = self.tables.read().expect("store lock poisoned");
        Ok(tables
            .sequences
            .values()
            .filter(|s| s.status == SequenceStatus::Active)
            .filter(|s| s.next_fire_at.map_or(false, |fire_at| fire_at <= as_of))
            .cloned()
            .collect())
    }

    async fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::lead::{ChannelKind, ContactInfo, LeadSource, LeadStatus, LeadType, Qualification};
    use std::collections::BTreeSet;

    fn sample_lead() -> Lead {
        let now = Utc::now();
        Lead {
            id: Uuid::new_v4(),
            source: LeadSource::Website,
            contact: ContactInfo {
                name: "Jane".to_string(),
                email: Some("jane@example.com".to_string()),
                phone: None,
                preferred_channel: ChannelKind::Email,
                timezone: "UTC".to_string(),
            },
            lead_type: LeadType::Hot,
            urgency: 8,
            intent_signals: BTreeSet::new(),
            qualification: Qualification::default(),
            status: LeadStatus::New,
            assigned_agent: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = InMemoryStore::new();
        let lead = sample_lead();
        store.upsert_lead(lead.clone()).await.unwrap();
        let fetched = store.get_lead(lead.id).await.unwrap().unwrap();
        assert_eq!(fetched, lead);
    }

    #[tokio::test]
    async fn query_leads_filters_by_status() {
        let store = InMemoryStore::new();
        let mut l1 = sample_lead();
        l1.status = LeadStatus::Contacted;
        let l2 = sample_lead();
        store.upsert_lead(l1.clone()).await.unwrap();
        store.upsert_lead(l2).await.unwrap();

        let filtered = store
            .query_leads(LeadFilter {
                status: Some(LeadStatus::Contacted),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, l1.id);
    }

    #[tokio::test]
    async fn list_due_sequences_excludes_future_and_inactive() {
        use crate::data_models::sequence::SequenceKind;

        let store = InMemoryStore::new();
        let now = Utc::now();
        let due = OutboundSequence {
            id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            kind: SequenceKind::Cold,
            current_step: 1,
            total_steps: 5,
            next_fire_at: Some(now - chrono::Duration::minutes(1)),
            status: SequenceStatus::Active,
            interaction_ids: vec![],
        };
        let mut not_yet_due = due.clone();
        not_yet_due.id = Uuid::new_v4();
        not_yet_due.next_fire_at = Some(now + chrono::Duration::hours(1));
        let mut completed = due.clone();
        completed.id = Uuid::new_v4();
        completed.current_step = 5;
        completed.status = SequenceStatus::Completed;
        completed.next_fire_at = None;

        store.upsert_sequence(due.clone()).await.unwrap();
        store.upsert_sequence(not_yet_due).await.unwrap();
        store.upsert_sequence(completed).await.unwrap();

        let result = store.list_due_sequences(now).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, due.id);
    }

    #[tokio::test]
    async fn concurrent_upserts_to_different_leads_do_not_block_each_other() {
        let store = Arc::new(InMemoryStore::new());
        let l1 = sample_lead();
        let l2 = sample_lead();
        let (s1, s2) = (store.clone(), store.clone());
        let (id1, id2) = (l1.id, l2.id);
        let h1 = tokio::spawn(async move { s1.upsert_lead(l1).await });
        let h2 = tokio::spawn(async move { s2.upsert_lead(l2).await });
        h1.await.unwrap().unwrap();
        h2.await.unwrap().unwrap();
        assert!(store.get_lead(id1).await.unwrap().is_some());
        assert!(store.get_lead(id2).await.unwrap().is_some());
    }
}
