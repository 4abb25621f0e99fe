use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::contracts::{CoreError, CoreErrorKind};
use crate::data_models::audit::{AuditAction, AuditLogEntry};
use crate::data_models::lead::{Lead, LeadStatus};
use crate::store::Store;
use crate::subsystems::ingestion::dedup::Deduplicator;
use crate::subsystems::ingestion::normalizer::normalize;
use crate::utils::logger::log_ingestion_event;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestionResult {
    pub success: bool,
    pub is_duplicate: bool,
    pub lead_id: Option<Uuid>,
    pub existing_id: Option<Uuid>,
    pub error: Option<String>,
}

impl IngestionResult {
    fn failure(error: CoreError) -> Self {
        Self {
            success: false,
            is_duplicate: false,
            lead_id: None,
            existing_id: None,
            error: Some(error.message),
        }
    }
}

/// # NDOC
/// component: `subsystems::ingestion::pipeline`
/// purpose: Orchestrates Normalizer -> Deduplicator -> Store for a batch of
///   raw leads. Each raw lead is processed in isolation — a single failure
///   never aborts the batch.
pub struct IngestionPipeline<'a> {
    store: &'a dyn Store,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Processes one raw lead end to end: normalize, dedup-check,
    /// merge-or-insert.
    pub async fn process_one(
        &self,
        raw_payload: &Value,
        source: crate::data_models::lead::LeadSource,
        now: DateTime<Utc>,
    ) -> IngestionResult {
        let normalized = match normalize(raw_payload, source) {
            Ok(n) => n,
            Err(e) => {
                log_ingestion_event(
                    "unknown",
                    "normalize_failed",
                    &serde_json::json!({"error": e.message}),
                );
                return IngestionResult::failure(e);
            }
        };

        let dedup = Deduplicator::new(self.store);
        let check = match dedup.check(&normalized, now).await {
            Ok(c) => c,
            Err(e) => return IngestionResult::failure(e),
        };

        if check.is_duplicate {
            let existing_id = check.existing_id.expect("is_duplicate implies existing_id");
            return match dedup.merge(existing_id, &normalized, now).await {
                Ok(()) => IngestionResult {
                    success: true,
                    is_duplicate: true,
                    lead_id: None,
                    existing_id: Some(existing_id),
                    error: None,
                },
                Err(e) => IngestionResult::failure(e),
            };
        }

        let lead = Lead {
            id: Uuid::new_v4(),
            source: normalized.source,
            contact: normalized.contact,
            lead_type: normalized.lead_type,
            urgency: normalized.urgency,
            intent_signals: normalized.intent_signals,
            qualification: normalized.qualification,
            status: LeadStatus::New,
            assigned_agent: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = lead.validate() {
            return IngestionResult::failure(e);
        }

        if let Err(e) = self.store.upsert_lead(lead.clone()).await {
            return IngestionResult::failure(e);
        }
        if let Err(e) = self
            .store
            .append_audit(AuditLogEntry {
                id: Uuid::new_v4(),
                entity_type: "lead".to_string(),
                entity_id: lead.id,
                action: AuditAction::Insert,
                changes: serde_json::json!({"lead": lead}),
                actor: "ingestion_pipeline".to_string(),
                timestamp: now,
                metadata: serde_json::json!({}),
            })
            .await
        {
            return IngestionResult::failure(e);
        }

        IngestionResult {
            success: true,
            is_duplicate: false,
            lead_id: Some(lead.id),
            existing_id: None,
            error: None,
        }
    }

    /// Processes a batch; a single item's failure never aborts the rest.
    pub async fn process_batch(
        &self,
        raw_payloads: &[(Value, crate::data_models::lead::LeadSource)],
        now: DateTime<Utc>,
    ) -> Vec<IngestionResult> {
        let mut results = Vec::with_capacity(raw_payloads.len());
        for (payload, source) in raw_payloads {
            results.push(self.process_one(payload, *source, now).await);
        }
        results
    }
}

/// Classifies a raw ingestion-path error into the error monitor's category
/// vocabulary, used by callers that escalate.
pub fn classify_ingestion_failure(error: &CoreError) -> &'static str {
    match error.kind {
        CoreErrorKind::ValidationError => "validation",
        CoreErrorKind::DuplicateConflict => "business_logic",
        CoreErrorKind::ExternalUnavailable | CoreErrorKind::Timeout => "network",
        CoreErrorKind::IntegrityError => "system",
        _ => "business_logic",
    }
}
