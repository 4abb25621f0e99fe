use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::data_models::control_plane::{OperatorOverride, OverrideKind};

/// # NDOC
/// component: `subsystems::control_plane::overrides`
/// purpose: Tracks active operator overrides and exposes the short-circuit
///   check the optimization loop consults before applying or synthesizing
///   recommendations for a given agent.
pub struct OverrideRegistry {
    overrides: RwLock<HashMap<Uuid, OperatorOverride>>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self {
            overrides: RwLock::new(HashMap::new()),
        }
    }

    pub async fn issue(&self, override_: OperatorOverride) {
        self.overrides.write().await.insert(override_.id, override_);
    }

    pub async fn reverse(&self, id: Uuid, now: DateTime<Utc>) {
        if let Some(override_) = self.overrides.write().await.get_mut(&id) {
            override_.reversed_at = Some(now);
        }
    }

    /// True iff an active `SuspendOptimization` override exists for
    /// `agent_id` (or a global one with no target).
    pub async fn is_optimization_suspended(&self, agent_id: &str, now: DateTime<Utc>) -> bool {
        let overrides = self.overrides.read().await;
        overrides.values().any(|o| {
            o.kind == OverrideKind::SuspendOptimization
                && o.is_active(now)
                && o.target_agent_id.as_deref().map_or(true, |target| target == agent_id)
        })
    }

    pub async fn active_for_agent(&self, agent_id: &str, now: DateTime<Utc>) -> Vec<OperatorOverride> {
        self.overrides
            .read()
            .await
            .values()
            .filter(|o| o.is_active(now) && o.target_agent_id.as_deref().map_or(true, |t| t == agent_id))
            .cloned()
            .collect()
    }
}

impl Default for OverrideRegistry {
    fn default() -> Self {
        Self::new()
    }
}
