//! Reference collaborator stores.
//!
//! Real deployments back these with the host application's settings storage;
//! the in-memory versions are for embedding and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};

use gantry_protocols::{
    AutoUpdatePolicy, CollaboratorError, ComponentId, EnablementChange, EnablementState,
    EnablementStore, PolicyStore,
};

/// In-memory enablement flag store.
pub struct MemoryEnablementStore {
    flags: RwLock<HashMap<ComponentId, EnablementState>>,
    changes: broadcast::Sender<EnablementChange>,
}

impl MemoryEnablementStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            flags: RwLock::new(HashMap::new()),
            changes,
        }
    }
}

impl Default for MemoryEnablementStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnablementStore for MemoryEnablementStore {
    async fn set_enablement(
        &self,
        identifiers: &[ComponentId],
        state: EnablementState,
    ) -> Result<Vec<ComponentId>, CollaboratorError> {
        let mut flags = self.flags.write().await;
        let mut changed = Vec::new();
        for identifier in identifiers {
            let current = flags.get(identifier).cloned().unwrap_or_default();
            if current != state {
                flags.insert(identifier.clone(), state.clone());
                changed.push(identifier.clone());
            }
        }
        drop(flags);

        if !changed.is_empty() {
            let _ = self.changes.send(EnablementChange {
                identifiers: changed.clone(),
                state,
            });
        }
        Ok(changed)
    }

    async fn enablement_state(&self, identifier: &ComponentId) -> EnablementState {
        self.flags
            .read()
            .await
            .get(identifier)
            .cloned()
            .unwrap_or_default()
    }

    async fn reset(&self, identifier: &ComponentId) -> Result<(), CollaboratorError> {
        self.flags.write().await.remove(identifier);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<EnablementChange> {
        self.changes.subscribe()
    }
}

/// In-memory auto-update policy store.
pub struct MemoryPolicyStore {
    policy: RwLock<AutoUpdatePolicy>,
}

impl MemoryPolicyStore {
    pub fn new(policy: AutoUpdatePolicy) -> Self {
        Self {
            policy: RwLock::new(policy),
        }
    }
}

impl Default for MemoryPolicyStore {
    fn default() -> Self {
        Self::new(AutoUpdatePolicy::default())
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn auto_update_policy(&self) -> AutoUpdatePolicy {
        *self.policy.read().await
    }

    async fn set_auto_update_policy(
        &self,
        policy: AutoUpdatePolicy,
    ) -> Result<(), CollaboratorError> {
        *self.policy.write().await = policy;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
