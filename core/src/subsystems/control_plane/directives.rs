use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::contracts::CoreResult;
use crate::data_models::control_plane::{Directive, DirectiveStatus};

/// # NDOC
/// component: `subsystems::control_plane::directives`
/// purpose: Lifecycle management for operator-issued directives. Wraps
///   `Directive::can_transition_to` with storage and an `InvalidStateTransition`
///   error on a rejected move.
pub struct DirectiveRegistry {
    directives: RwLock<HashMap<Uuid, Directive>>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self {
            directives: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, directive: Directive) {
        self.directives.write().await.insert(directive.id, directive);
    }

    pub async fn transition(&self, id: Uuid, to: DirectiveStatus) -> CoreResult<()> {
        let mut directives = self.directives.write().await;
        let directive = directives.get_mut(&id).ok_or_else(|| {
            crate::contracts::CoreError::validation(format!("unknown directive {id}"))
        })?;
        if !directive.can_transition_to(to) {
            return Err(crate::contracts::CoreError::invalid_state_transition(format!(
                "cannot move directive {id} from {:?} to {:?}",
                directive.status, to
            )));
        }
        directive.status = to;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Option<Directive> {
        self.directives.read().await.get(&id).cloned()
    }

    pub async fn active(&self) -> Vec<Directive> {
        self.directives
            .read()
            .await
            .values()
            .filter(|d| d.status == DirectiveStatus::Active)
            .cloned()
            .collect()
    }
}

impl Default for DirectiveRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::optimization::Priority;
    use chrono::Utc;

    fn sample() -> Directive {
        Directive {
            id: Uuid::new_v4(),
            title: "boost conversion".to_string(),
            target_agent_ids: vec!["agent-1".to_string()],
            priority: Priority::High,
            status: DirectiveStatus::Draft,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn valid_transition_succeeds() {
        let registry = DirectiveRegistry::new();
        let directive = sample();
        let id = directive.id;
        registry.create(directive).await;
        registry.transition(id, DirectiveStatus::Active).await.unwrap();
        assert_eq!(registry.get(id).await.unwrap().status, DirectiveStatus::Active);
    }

    #[tokio::test]
    async fn invalid_transition_is_rejected() {
        let registry = DirectiveRegistry::new();
        let directive = sample();
        let id = directive.id;
        registry.create(directive).await;
        let err = registry.transition(id, DirectiveStatus::Completed).await.unwrap_err();
        assert_eq!(err.kind, crate::contracts::CoreErrorKind::InvalidStateTransition);
    }
}
