//! The component manager facade.
//!
//! Owns the record set and every collaborator handle; exposes the local view,
//! the enablement surface, the install/uninstall request paths, the
//! auto-update surface, and one aggregated change stream. All record
//! mutation funnels through here.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gantry_protocols::{
    AutoUpdatePolicy, AutoUpdateTarget, CatalogQuery, CatalogService, CollaboratorError,
    ComponentChange, ComponentError, ComponentId, ConfirmationSurface, CopyMetadata,
    EnablementChange, EnablementState, EnablementStore, Host, HostId, HostManagement,
    InstalledCopy, LifecycleEvent, OperationalState, PolicyStore,
};

use crate::autoupdate;
use crate::config::ManagerConfig;
use crate::enablement;
use crate::lifecycle;
use crate::record::ComponentSnapshot;
use crate::registry::{ComponentSet, OperationKind, PendingOperation};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// The component manager.
pub struct ComponentManager {
    topology: Vec<Host>,
    hosts: DashMap<HostId, Arc<dyn HostManagement>>,
    catalog: Arc<dyn CatalogService>,
    enablement_store: Arc<dyn EnablementStore>,
    policy_store: Arc<dyn PolicyStore>,
    confirmation: Arc<dyn ConfirmationSurface>,
    records: RwLock<ComponentSet>,
    /// Serializes `set_enablement` so traversal sees a consistent snapshot.
    enablement_gate: Mutex<()>,
    changes: broadcast::Sender<ComponentChange>,
}

impl ComponentManager {
    pub fn new(
        config: &ManagerConfig,
        catalog: Arc<dyn CatalogService>,
        enablement_store: Arc<dyn EnablementStore>,
        policy_store: Arc<dyn PolicyStore>,
        confirmation: Arc<dyn ConfirmationSurface>,
    ) -> Self {
        let topology = config.topology();
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            records: RwLock::new(ComponentSet::new(topology.clone())),
            topology,
            hosts: DashMap::new(),
            catalog,
            enablement_store,
            policy_store,
            confirmation,
            enablement_gate: Mutex::new(()),
            changes,
        }
    }

    /// Register the management handle for one topology host. Handles outside
    /// the configured topology are never consulted.
    pub fn register_host(&self, handle: Arc<dyn HostManagement>) {
        let host = handle.host().clone();
        if !self.topology.iter().any(|known| known.id == host.id) {
            warn!("Host '{}' is not part of the configured topology", host.id);
        }
        self.hosts.insert(host.id, handle);
    }

    /// Subscribe to the aggregated change stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ComponentChange> {
        self.changes.subscribe()
    }

    /// Spawn one pump task per registered host plus one for external
    /// enablement-store changes, each draining its stream in arrival order.
    pub fn run_event_pumps(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for entry in self.hosts.iter() {
            let host_id = entry.key().clone();
            let mut events = entry.value().lifecycle_events();
            let manager = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                loop {
                    match events.recv().await {
                        Ok(event) => manager.handle_lifecycle_event(&host_id, event).await,
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!("Host '{}' event stream lagged by {} events", host_id, missed);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }));
        }

        let mut store_changes = self.enablement_store.subscribe();
        let manager = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            loop {
                match store_changes.recv().await {
                    Ok(change) => manager.apply_store_change(change).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Enablement store stream lagged by {} events", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
        handles
    }

    /// Read-only, ordered view of every known component.
    pub async fn local(&self) -> Vec<ComponentSnapshot> {
        self.records.read().await.snapshots_sorted()
    }

    pub async fn component(&self, identifier: &ComponentId) -> Option<ComponentSnapshot> {
        self.records
            .read()
            .await
            .get(identifier)
            .map(|record| record.snapshot())
    }

    /// Ask every registered topology host for its installed set, reconcile,
    /// and refresh cached enablement. Nothing is published until all hosts
    /// have responded; any host failure leaves the record set untouched.
    pub async fn query_local(&self) -> Result<Vec<ComponentSnapshot>, ComponentError> {
        let handles: Vec<(HostId, Arc<dyn HostManagement>)> = self
            .topology
            .iter()
            .filter_map(|host| {
                self.hosts
                    .get(&host.id)
                    .map(|entry| (host.id.clone(), Arc::clone(entry.value())))
            })
            .collect();

        let results = join_all(handles.iter().map(|(_, handle)| handle.installed())).await;
        let mut installed: Vec<(HostId, Vec<InstalledCopy>)> = Vec::with_capacity(results.len());
        for ((host_id, _), result) in handles.into_iter().zip(results) {
            installed.push((host_id, result?));
        }

        let mut set = self.records.write().await;
        lifecycle::reconcile(&mut set, installed);
        let identifiers: Vec<ComponentId> =
            set.iter().map(|record| record.identifier.clone()).collect();
        for identifier in &identifiers {
            let state = self.enablement_store.enablement_state(identifier).await;
            if let Some(record) = set.get_mut(identifier) {
                record.set_enablement_state(state);
            }
        }
        let snapshots = set.snapshots_sorted();
        drop(set);

        self.emit(ComponentChange::Refreshed);
        Ok(snapshots)
    }

    /// Run a catalog search and merge every entry into the record set.
    pub async fn query_catalog(
        &self,
        query: &CatalogQuery,
    ) -> Result<Vec<ComponentSnapshot>, ComponentError> {
        let page = self.catalog.query(query).await?;
        debug!(
            "Catalog query returned {} of {} entries",
            page.entries.len(),
            page.total
        );

        let mut set = self.records.write().await;
        let mut snapshots = Vec::with_capacity(page.entries.len());
        for entry in page.entries {
            let identifier = entry.identifier.clone();
            set.merge_catalog_entry(entry);
            if let Some(record) = set.get(&identifier) {
                snapshots.push(record.snapshot());
            }
        }
        drop(set);

        self.emit(ComponentChange::Refreshed);
        Ok(snapshots)
    }

    /// Apply an enablement change to the requested components and everything
    /// the dependency/pack graph pulls in with them; all or nothing.
    pub async fn set_enablement(
        &self,
        identifiers: &[ComponentId],
        state: EnablementState,
    ) -> Result<(), ComponentError> {
        let _gate = self.enablement_gate.lock().await;

        let resolution = {
            let set = self.records.read().await;
            for identifier in identifiers {
                let record = set
                    .get(identifier)
                    .ok_or_else(|| ComponentError::UnknownComponent(identifier.clone()))?;
                if record.operational_state == OperationalState::Uninstalled {
                    return Err(ComponentError::NotAllowed(format!(
                        "{identifier} is not installed"
                    )));
                }
            }
            enablement::resolve(&set, identifiers, &state)
        };

        let mut to_commit = resolution.to_commit.clone();
        if resolution.requires_confirmation() {
            let names: Vec<String> = resolution
                .dependents
                .iter()
                .map(ToString::to_string)
                .collect();
            let message = format!(
                "Other components depend on the ones being disabled: {}. Disable those as well?",
                names.join(", ")
            );
            match self
                .confirmation
                .prompt_choice(&message, &["Disable All", "Cancel"])
                .await
            {
                Some(0) => to_commit.extend(resolution.dependents.iter().cloned()),
                _ => {
                    debug!("Cascading disable declined for {} dependents", names.len());
                    return Err(ComponentError::NotAllowed(
                        "cascading disable was declined".to_string(),
                    ));
                }
            }
        }

        let changed = self
            .enablement_store
            .set_enablement(&to_commit, state.clone())
            .await?;

        let mut set = self.records.write().await;
        for identifier in &to_commit {
            if let Some(record) = set.get_mut(identifier) {
                record.set_enablement_state(state.clone());
            }
        }
        drop(set);

        if !changed.is_empty() {
            info!(
                "Enablement change committed: {} components now {:?}",
                changed.len(),
                state
            );
            self.emit(ComponentChange::Enablement {
                identifiers: changed,
                state,
            });
        }
        Ok(())
    }

    /// Whether an install request for this component would be accepted.
    pub async fn can_install(&self, identifier: &ComponentId) -> bool {
        let entry = {
            let set = self.records.read().await;
            let Some(record) = set.get(identifier) else {
                return false;
            };
            if record.is_system() || record.operational_state != OperationalState::Uninstalled {
                return false;
            }
            match record.catalog_copy.clone() {
                Some(entry) => entry,
                None => return false,
            }
        };

        for host in &self.topology {
            let Some(handle) = self.hosts.get(&host.id).map(|e| Arc::clone(e.value())) else {
                continue;
            };
            if handle.can_install(&entry).await.is_ok() {
                return true;
            }
        }
        false
    }

    /// Request an install from the catalog. State changes only ever arrive
    /// through the host's event stream; a request that fails here leaves the
    /// record in its prior state.
    pub async fn install(&self, identifier: &ComponentId) -> Result<(), ComponentError> {
        let entry = {
            let set = self.records.read().await;
            let record = set
                .get(identifier)
                .ok_or_else(|| ComponentError::UnknownComponent(identifier.clone()))?;
            if record.is_system() {
                return Err(ComponentError::NotAllowed(
                    "system components are not installable".to_string(),
                ));
            }
            if record.operational_state != OperationalState::Uninstalled {
                return Err(ComponentError::NotAllowed(format!(
                    "{identifier} is already {}",
                    record.operational_state
                )));
            }
            if set.pending(identifier).is_some() {
                return Err(ComponentError::NotAllowed(format!(
                    "an operation is already in flight for {identifier}"
                )));
            }
            record.catalog_copy.clone().ok_or_else(|| {
                ComponentError::NotAllowed(format!("{identifier} has no catalog entry"))
            })?
        };

        let entry = self
            .catalog
            .compatible(&entry)
            .await?
            .ok_or_else(|| {
                ComponentError::NotAllowed(format!(
                    "no compatible version of {identifier} is available"
                ))
            })?;

        let mut refusals: Vec<String> = Vec::new();
        for host in &self.topology {
            let Some(handle) = self.hosts.get(&host.id).map(|e| Arc::clone(e.value())) else {
                continue;
            };
            match handle.can_install(&entry).await {
                Ok(()) => {
                    info!("Installing {} v{} on {}", identifier, entry.version, host.id);
                    self.records.write().await.begin_operation(
                        identifier,
                        PendingOperation {
                            kind: OperationKind::Install,
                            host: host.id.clone(),
                            source: Some(entry.clone()),
                        },
                    );
                    if let Err(error) = handle.install(&entry).await {
                        self.records.write().await.finish_operation(identifier);
                        return Err(error.into());
                    }
                    return Ok(());
                }
                Err(reason) => refusals.push(format!("{}: {reason}", host.id)),
            }
        }
        Err(ComponentError::NotAllowed(format!(
            "no host can install {identifier} ({})",
            refusals.join("; ")
        )))
    }

    /// Request an uninstall from every host holding a copy. The record enters
    /// Uninstalling before delegation and reverts if delegation fails.
    pub async fn uninstall(&self, identifier: &ComponentId) -> Result<(), ComponentError> {
        let copies: Vec<(HostId, InstalledCopy)> = {
            let set = self.records.read().await;
            let record = set
                .get(identifier)
                .ok_or_else(|| ComponentError::UnknownComponent(identifier.clone()))?;
            if record.is_system() {
                return Err(ComponentError::NotAllowed(
                    "system components cannot be uninstalled".to_string(),
                ));
            }
            if record.operational_state != OperationalState::Installed {
                return Err(ComponentError::NotAllowed(format!(
                    "{identifier} is not installed"
                )));
            }
            record
                .host_copies
                .iter()
                .map(|(host, copy)| (host.clone(), copy.clone()))
                .collect()
        };

        let change = {
            let mut set = self.records.write().await;
            lifecycle::apply_event(
                &mut set,
                &copies[0].0,
                LifecycleEvent::UninstallStarted {
                    identifier: identifier.clone(),
                },
            )
        };
        if let Some(change) = change {
            self.emit(change);
        }

        for (host_id, copy) in copies {
            let handle = match self.host_handle(&host_id) {
                Ok(handle) => handle,
                Err(error) => return Err(self.rollback_uninstall(identifier, error).await),
            };
            if let Err(error) = handle.uninstall(&copy).await {
                return Err(self.rollback_uninstall(identifier, error.into()).await);
            }
        }
        Ok(())
    }

    /// Components explicitly opted in to auto-update under a `Nothing`
    /// policy.
    pub async fn enabled_auto_update_components(&self) -> Vec<ComponentId> {
        let policy = self.policy_store.auto_update_policy().await;
        let set = self.records.read().await;
        autoupdate::enabled_auto_update_components(&set, policy)
    }

    /// Components pinned against an enabled policy.
    pub async fn disabled_auto_update_components(&self) -> Vec<ComponentId> {
        let policy = self.policy_store.auto_update_policy().await;
        let set = self.records.read().await;
        autoupdate::disabled_auto_update_components(&set, policy)
    }

    /// Toggle auto-update for one component or a whole publisher by writing
    /// the pin metadata through the owning host.
    pub async fn update_auto_update_enablement_for(
        &self,
        target: &AutoUpdateTarget,
        enable: bool,
    ) -> Result<(), ComponentError> {
        let policy = self.policy_store.auto_update_policy().await;
        autoupdate::validate_target(policy, target)?;

        let identifiers = {
            let set = self.records.read().await;
            autoupdate::expand_target(&set, target)
        };
        if let AutoUpdateTarget::Component(identifier) = target {
            if !self.records.read().await.contains(identifier) {
                return Err(ComponentError::UnknownComponent(identifier.clone()));
            }
        }

        let metadata = CopyMetadata {
            pinned: !enable,
            auto_update: Some(enable),
        };
        let mut touched: Vec<ComponentId> = Vec::new();
        for identifier in &identifiers {
            let (host_id, copy) = {
                let set = self.records.read().await;
                let record = set
                    .get(identifier)
                    .ok_or_else(|| ComponentError::UnknownComponent(identifier.clone()))?;
                if record.operational_state != OperationalState::Installed {
                    return Err(ComponentError::NotAllowed(format!(
                        "{identifier} is not installed"
                    )));
                }
                let host_id = record
                    .canonical_host
                    .clone()
                    .ok_or_else(|| ComponentError::NoCanonicalHost(identifier.clone()))?;
                let copy = record
                    .canonical_copy()
                    .cloned()
                    .ok_or_else(|| ComponentError::NoCanonicalHost(identifier.clone()))?;
                (host_id, copy)
            };
            if copy.metadata == metadata {
                continue;
            }

            let handle = self.host_handle(&host_id)?;
            let updated = handle.update_metadata(&copy, metadata).await?;
            self.records.write().await.upsert_installed(&host_id, updated);
            touched.push(identifier.clone());
        }

        if !touched.is_empty() {
            debug!("Auto-update toggled for {} components", touched.len());
            self.emit(ComponentChange::AutoUpdate {
                identifiers: touched,
            });
        }
        Ok(())
    }

    /// Flip the global policy and clear every per-component exception so the
    /// new policy starts from a clean slate.
    pub async fn update_auto_update_for_all(&self, enable: bool) -> Result<(), ComponentError> {
        let policy = if enable {
            AutoUpdatePolicy::Everything
        } else {
            AutoUpdatePolicy::Nothing
        };
        self.policy_store.set_auto_update_policy(policy).await?;

        for host in &self.topology {
            if let Some(handle) = self.hosts.get(&host.id).map(|e| Arc::clone(e.value())) {
                handle.reset_metadata_for_all().await?;
            }
        }

        let cleared = {
            let mut set = self.records.write().await;
            let identifiers: Vec<ComponentId> = set
                .iter()
                .filter(|record| !record.host_copies.is_empty())
                .map(|record| record.identifier.clone())
                .collect();
            for identifier in &identifiers {
                if let Some(record) = set.get_mut(identifier) {
                    for copy in record.host_copies.values_mut() {
                        copy.metadata = CopyMetadata::default();
                    }
                }
            }
            identifiers
        };

        info!("Auto-update policy set to {:?}; exceptions cleared", policy);
        if !cleared.is_empty() {
            self.emit(ComponentChange::AutoUpdate {
                identifiers: cleared,
            });
        }
        Ok(())
    }

    /// Apply one lifecycle event from a host stream.
    pub async fn handle_lifecycle_event(&self, host: &HostId, event: LifecycleEvent) {
        let clean_uninstall = matches!(
            event,
            LifecycleEvent::UninstallFinished { error: None, .. }
        );
        let identifier = event.identifier().clone();

        let change = {
            let mut set = self.records.write().await;
            lifecycle::apply_event(&mut set, host, event)
        };

        if clean_uninstall {
            let fully_gone = {
                let set = self.records.read().await;
                set.get(&identifier)
                    .is_none_or(|record| record.operational_state == OperationalState::Uninstalled)
            };
            if fully_gone {
                if let Err(error) = self.enablement_store.reset(&identifier).await {
                    warn!("Failed to reset enablement flags for {}: {}", identifier, error);
                }
            }
        }

        if let Some(change) = change {
            self.emit(change);
        }
    }

    async fn apply_store_change(&self, change: EnablementChange) {
        let mut touched: Vec<ComponentId> = Vec::new();
        {
            let mut set = self.records.write().await;
            for identifier in &change.identifiers {
                if let Some(record) = set.get_mut(identifier) {
                    if record.enablement_state != change.state {
                        record.set_enablement_state(change.state.clone());
                        touched.push(identifier.clone());
                    }
                }
            }
        }
        if !touched.is_empty() {
            self.emit(ComponentChange::Enablement {
                identifiers: touched,
                state: change.state,
            });
        }
    }

    async fn rollback_uninstall(
        &self,
        identifier: &ComponentId,
        error: ComponentError,
    ) -> ComponentError {
        warn!("Uninstall request for {} failed: {}", identifier, error);
        let change = {
            let mut set = self.records.write().await;
            set.finish_operation(identifier);
            set.get_mut(identifier).map(|record| {
                record.operational_state = if record.host_copies.is_empty() {
                    OperationalState::Uninstalled
                } else {
                    OperationalState::Installed
                };
                ComponentChange::Lifecycle {
                    identifier: identifier.clone(),
                    state: record.operational_state,
                }
            })
        };
        if let Some(change) = change {
            self.emit(change);
        }
        error
    }

    fn host_handle(&self, host: &HostId) -> Result<Arc<dyn HostManagement>, ComponentError> {
        self.hosts
            .get(host)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                CollaboratorError::Host {
                    host: host.clone(),
                    message: "no management handle registered".to_string(),
                }
                .into()
            })
    }

    fn emit(&self, change: ComponentChange) {
        let _ = self.changes.send(change);
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
