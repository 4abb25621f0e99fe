/// # NDOC
/// component: `store`
/// purpose: The transactional persistence contract and its in-process
///   reference implementation.
pub mod memory_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contracts::CoreError;
use crate::data_models::audit::AuditLogEntry;
use crate::data_models::interaction::Interaction;
use crate::data_models::lead::Lead;
use crate::data_models::optimization::OptimizationResult;
use crate::data_models::performance::{PerformanceSnapshot, Period};
use crate::data_models::sequence::OutboundSequence;

#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    pub status: Option<crate::data_models::lead::LeadStatus>,
    pub source: Option<crate::data_models::lead::LeadSource>,
    pub assigned_agent: Option<String>,
}

/// # NDOC
/// component: `store`
/// purpose: Entity-level transactional contract. A real deployment backs
///   this with a database; tests and single-node operation use
///   `memory_store::InMemoryStore`. Transactions use read-committed
///   isolation; the ingestion insert path is serializable per lead.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_lead(&self, id: Uuid) -> Result<Option<Lead>, CoreError>;
    async fn upsert_lead(&self, lead: Lead) -> Result<(), CoreError>;
    async fn query_leads(&self, filter: LeadFilter) -> Result<Vec<Lead>, CoreError>;

    /// Appends an interaction and its audit row in one transaction.
    async fn append_interaction(
        &self,
        interaction: Interaction,
        audit_actor: &str,
    ) -> Result<(), CoreError>;
    async fn query_interactions_for_agent(
        &self,
        agent_id: &str,
        period: Period,
    ) -> Result<Vec<Interaction>, CoreError>;
    async fn query_interactions_for_lead(&self, lead_id: Uuid) -> Result<Vec<Interaction>, CoreError>;

    /// Unique on `(agent_id, period)`.
    async fn upsert_performance(&self, snapshot: PerformanceSnapshot) -> Result<(), CoreError>;
    async fn get_performance(
        &self,
        agent_id: &str,
        period: Period,
    ) -> Result<Option<PerformanceSnapshot>, CoreError>;

    async fn append_audit(&self, entry: AuditLogEntry) -> Result<(), CoreError>;
    async fn query_audit_for_entity(&self, entity_id: Uuid) -> Result<Vec<AuditLogEntry>, CoreError>;

    /// Durable home for the optimization loop's `history` map. The loop's
    /// in-memory `active_optimizations` index is rebuildable from here on
    /// restart by filtering for pending outcomes.
    async fn upsert_optimization_result(&self, result: OptimizationResult) -> Result<(), CoreError>;
    async fn get_optimization_result(
        &self,
        recommendation_id: Uuid,
    ) -> Result<Option<OptimizationResult>, CoreError>;
    async fn list_pending_optimization_results(&self) -> Result<Vec<OptimizationResult>, CoreError>;

    /// Unique on `id`. The tick dispatcher rebuilds its due-work list from
    /// `list_due_sequences` every tick rather than holding its own index.
    async fn upsert_sequence(&self, sequence: OutboundSequence) -> Result<(), CoreError>;
    async fn get_sequence(&self, id: Uuid) -> Result<Option<OutboundSequence>, CoreError>;
    async fn list_due_sequences(&self, as_of: DateTime<Utc>) -> Result<Vec<OutboundSequence>, CoreError>;

    async fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
