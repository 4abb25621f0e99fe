use async_trait::async_trait;
use serde_json::Value;

use crate::contracts::CoreError;

/// # NDOC
/// component: `external::routing_agent`
/// purpose: The target of optimization loop mutations — a worker agent's
///   routing policy object. `add_routing_rule`/`remove_routing_rule` are
///   idempotent by rule id, so rollback plans can be replayed safely.
#[async_trait]
pub trait RoutingAgent: Send + Sync {
    fn agent_id(&self) -> &str;
    async fn update_config(&self, partial_config: Value) -> Result<(), CoreError>;
    async fn add_routing_rule(&self, rule: Value) -> Result<(), CoreError>;
    async fn remove_routing_rule(&self, rule_id: &str) -> Result<(), CoreError>;
}

/// In-memory mock routing agent used by tests and local runs; records every
/// mutation so assertions can inspect apply/rollback ordering.
pub struct MockRoutingAgent {
    agent_id: String,
    calls: tokio::sync::Mutex<Vec<String>>,
}

impl MockRoutingAgent {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            calls: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    pub async fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl RoutingAgent for MockRoutingAgent {
    fn agent_id(&self) -> &str {
        &self.agent_id
    }

    async fn update_config(&self, partial_config: Value) -> Result<(), CoreError> {
        self.calls
            .lock()
            .await
            .push(format!("update_config:{partial_config}"));
        Ok(())
    }

    async fn add_routing_rule(&self, rule: Value) -> Result<(), CoreError> {
        self.calls.lock().await.push(format!("add_routing_rule:{rule}"));
        Ok(())
    }

    async fn remove_routing_rule(&self, rule_id: &str) -> Result<(), CoreError> {
        self.calls
            .lock()
            .await
            .push(format!("remove_routing_rule:{rule_id}"));
        Ok(())
    }
}
