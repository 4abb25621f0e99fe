use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Insert,
    Update,
    Merge,
    Transition,
    Rollback,
}

/// # NDOC
/// component: `data_models::audit`
/// purpose: Append-only record of every Lead/Interaction/Sync mutation.
///   Entries are never updated or deleted once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub changes: Value,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Value,
}
