//! Event payloads flowing between hosts, the enablement store, and consumers.

use serde::{Deserialize, Serialize};

use crate::{CatalogEntry, ComponentId, EnablementState, InstalledCopy, OperationalState};

/// Install/uninstall progress reported by a host's event stream.
///
/// A finished event carrying an error reverts the record instead of
/// advancing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    InstallStarted {
        identifier: ComponentId,
        /// Catalog source kept for display while the install is in flight.
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<CatalogEntry>,
    },
    InstallFinished {
        identifier: ComponentId,
        /// The new installed copy; absent when the install failed.
        #[serde(skip_serializing_if = "Option::is_none")]
        copy: Option<InstalledCopy>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    UninstallStarted {
        identifier: ComponentId,
    },
    UninstallFinished {
        identifier: ComponentId,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl LifecycleEvent {
    /// The identifier this event concerns.
    pub fn identifier(&self) -> &ComponentId {
        match self {
            Self::InstallStarted { identifier, .. }
            | Self::InstallFinished { identifier, .. }
            | Self::UninstallStarted { identifier }
            | Self::UninstallFinished { identifier, .. } => identifier,
        }
    }
}

/// Enablement-store change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnablementChange {
    pub identifiers: Vec<ComponentId>,
    pub state: EnablementState,
}

/// Aggregated change notification emitted by the component manager.
///
/// Enablement commits arrive as one batched value per commit, never one per
/// identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentChange {
    Lifecycle {
        identifier: ComponentId,
        state: OperationalState,
    },
    Enablement {
        identifiers: Vec<ComponentId>,
        state: EnablementState,
    },
    AutoUpdate {
        identifiers: Vec<ComponentId>,
    },
    /// The record set was reconciled against every host.
    Refreshed,
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
