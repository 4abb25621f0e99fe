use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::data_models::control_plane::{AgentOperationalStatus, AgentRegistration};

const HEARTBEAT_STALE_AFTER: chrono::Duration = chrono::Duration::minutes(5);

/// # NDOC
/// component: `subsystems::control_plane::registry`
/// purpose: Tracks each worker agent's last known operational status via
///   heartbeats; an agent whose heartbeat has gone stale is reported as
///   `degraded` even if it never explicitly reported that status.
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, AgentRegistration>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
        }
    }

    pub async fn heartbeat(&self, agent_id: &str, status: AgentOperationalStatus, now: DateTime<Utc>) {
        let mut agents = self.agents.write().await;
        agents.insert(
            agent_id.to_string(),
            AgentRegistration {
                agent_id: agent_id.to_string(),
                status,
                last_heartbeat_at: now,
            },
        );
    }

    /// Returns the agent's effective status: stored status, unless its
    /// heartbeat is stale, in which case `degraded`.
    pub async fn effective_status(&self, agent_id: &str, now: DateTime<Utc>) -> Option<AgentOperationalStatus> {
        let agents = self.agents.read().await;
        agents.get(agent_id).map(|reg| {
            if now.signed_duration_since(reg.last_heartbeat_at) > HEARTBEAT_STALE_AFTER {
                AgentOperationalStatus::Degraded
            } else {
                reg.status
            }
        })
    }

    pub async fn all(&self) -> Vec<AgentRegistration> {
        self.agents.read().await.values().cloned().collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
