//! Collaborator protocol definitions.
//!
//! The component manager consumes these services; it never owns persistence,
//! transport, or any visual surface itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::CollaboratorError;
use crate::events::{EnablementChange, LifecycleEvent};
use crate::{
    CatalogEntry, CatalogPage, CatalogQuery, ComponentId, CopyMetadata, EnablementState, Host,
    InstalledCopy,
};

/// Component management for one execution host.
#[async_trait]
pub trait HostManagement: Send + Sync {
    /// Static description of this host.
    fn host(&self) -> &Host;

    /// All copies currently installed on this host.
    async fn installed(&self) -> Result<Vec<InstalledCopy>, CollaboratorError>;

    /// Subscribe to this host's install/uninstall event stream.
    fn lifecycle_events(&self) -> broadcast::Receiver<LifecycleEvent>;

    /// Start installing the given catalog entry. Progress is reported through
    /// the event stream, never through the return value.
    async fn install(&self, entry: &CatalogEntry) -> Result<(), CollaboratorError>;

    /// Start uninstalling the given copy.
    async fn uninstall(&self, copy: &InstalledCopy) -> Result<(), CollaboratorError>;

    /// Replace the user-writable metadata section of a copy, returning the
    /// updated copy.
    async fn update_metadata(
        &self,
        copy: &InstalledCopy,
        metadata: CopyMetadata,
    ) -> Result<InstalledCopy, CollaboratorError>;

    /// Whether this host would accept an install of the entry; `Err` carries
    /// the refusal reason.
    async fn can_install(&self, entry: &CatalogEntry) -> Result<(), String>;

    /// Clear the metadata section of every installed copy.
    async fn reset_metadata_for_all(&self) -> Result<(), CollaboratorError>;
}

/// Catalog/query service supplying component metadata.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Run a paged catalog search.
    async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage, CollaboratorError>;

    /// Resolve the newest entry compatible with this application, if any.
    async fn compatible(
        &self,
        entry: &CatalogEntry,
    ) -> Result<Option<CatalogEntry>, CollaboratorError>;
}

/// Durable per-scope enablement flags.
///
/// The store owns persistence and may reject a write that violates invariants
/// it owns; a rejection is a hard failure, never retried.
#[async_trait]
pub trait EnablementStore: Send + Sync {
    /// Persist a state for the identifiers, returning those whose stored
    /// state actually changed.
    async fn set_enablement(
        &self,
        identifiers: &[ComponentId],
        state: EnablementState,
    ) -> Result<Vec<ComponentId>, CollaboratorError>;

    /// The stored state for an identifier (`EnabledGlobally` when unset).
    async fn enablement_state(&self, identifier: &ComponentId) -> EnablementState;

    /// Drop every stored flag for an identifier (used when the component is
    /// uninstalled everywhere).
    async fn reset(&self, identifier: &ComponentId) -> Result<(), CollaboratorError>;

    /// Subscribe to changes made through this store, including external ones.
    fn subscribe(&self) -> broadcast::Receiver<EnablementChange>;
}

/// Global auto-update policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoUpdatePolicy {
    /// Update every installed component.
    Everything,
    /// Update only components that are currently enabled.
    EnabledOnly,
    /// Update nothing unless explicitly opted in.
    Nothing,
}

impl Default for AutoUpdatePolicy {
    fn default() -> Self {
        Self::Everything
    }
}

impl AutoUpdatePolicy {
    /// Whether the policy updates components by default.
    pub fn updates_by_default(&self) -> bool {
        !matches!(self, Self::Nothing)
    }
}

/// Target of a per-component or per-publisher auto-update toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoUpdateTarget {
    Component(ComponentId),
    Publisher(String),
}

/// Read/write access to the global auto-update policy.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn auto_update_policy(&self) -> AutoUpdatePolicy;

    async fn set_auto_update_policy(
        &self,
        policy: AutoUpdatePolicy,
    ) -> Result<(), CollaboratorError>;
}

/// User confirmation for cascading enablement changes.
#[async_trait]
pub trait ConfirmationSurface: Send + Sync {
    /// Present a choice; returns the chosen button index, or `None` when the
    /// user cancelled.
    async fn prompt_choice(&self, message: &str, buttons: &[&str]) -> Option<usize>;
}
