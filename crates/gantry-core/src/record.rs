//! The unified component view model.

use serde::Serialize;
use std::collections::HashMap;

use gantry_protocols::{
    CatalogEntry, ComponentId, EnablementState, HostId, InstalledCopy, OperationalState,
};

/// The unified, host-agnostic record for one logical component.
///
/// Merges every host's installed copy with catalog metadata. Mutated only by
/// the owning record set; consumers receive [`ComponentSnapshot`] values.
#[derive(Debug, Clone)]
pub struct ComponentRecord {
    pub identifier: ComponentId,
    pub host_copies: HashMap<HostId, InstalledCopy>,
    pub catalog_copy: Option<CatalogEntry>,
    /// The host whose copy is authoritative; recomputed whenever
    /// `host_copies` changes.
    pub canonical_host: Option<HostId>,
    pub operational_state: OperationalState,
    pub(crate) enablement_state: EnablementState,
}

impl ComponentRecord {
    pub fn new(identifier: ComponentId) -> Self {
        Self {
            identifier,
            host_copies: HashMap::new(),
            catalog_copy: None,
            canonical_host: None,
            operational_state: OperationalState::Uninstalled,
            enablement_state: EnablementState::EnabledGlobally,
        }
    }

    pub fn from_catalog(entry: CatalogEntry) -> Self {
        let mut record = Self::new(entry.identifier.clone());
        record.catalog_copy = Some(entry);
        record
    }

    /// Attach or refresh catalog metadata, adopting its UUID.
    pub fn set_catalog_copy(&mut self, entry: CatalogEntry) {
        if self.identifier.uuid.is_none() {
            self.identifier.uuid = entry.identifier.uuid;
        }
        self.catalog_copy = Some(entry);
    }

    /// The canonical host's installed copy.
    pub fn canonical_copy(&self) -> Option<&InstalledCopy> {
        self.canonical_host
            .as_ref()
            .and_then(|host| self.host_copies.get(host))
    }

    /// Declared dependencies: canonical copy first, catalog fallback when
    /// nothing is installed.
    pub fn depends_on(&self) -> &[ComponentId] {
        self.canonical_copy()
            .map(|copy| copy.depends_on.as_slice())
            .or_else(|| {
                self.catalog_copy
                    .as_ref()
                    .map(|entry| entry.depends_on.as_slice())
            })
            .unwrap_or(&[])
    }

    /// Declared pack members, with the same canonical-then-catalog fallback.
    pub fn pack_members(&self) -> &[ComponentId] {
        self.canonical_copy()
            .map(|copy| copy.pack_members.as_slice())
            .or_else(|| {
                self.catalog_copy
                    .as_ref()
                    .map(|entry| entry.pack_members.as_slice())
            })
            .unwrap_or(&[])
    }

    /// Effective enablement. Uninstalled components are always enabled;
    /// stored flags only constrain installed ones.
    pub fn enablement_state(&self) -> EnablementState {
        if self.operational_state == OperationalState::Uninstalled {
            EnablementState::EnabledGlobally
        } else {
            self.enablement_state.clone()
        }
    }

    pub fn set_enablement_state(&mut self, state: EnablementState) {
        self.enablement_state = state;
    }

    pub fn is_enabled(&self) -> bool {
        self.enablement_state().is_enabled()
    }

    pub fn is_system(&self) -> bool {
        self.canonical_copy().is_some_and(|copy| copy.system)
    }

    pub fn pinned(&self) -> bool {
        self.canonical_copy().is_some_and(|copy| copy.metadata.pinned)
    }

    /// Explicit per-component auto-update mark, if the user set one.
    pub fn auto_update_mark(&self) -> Option<bool> {
        self.canonical_copy().and_then(|copy| copy.metadata.auto_update)
    }

    pub fn installed_version(&self) -> Option<&str> {
        self.canonical_copy().map(|copy| copy.version.as_str())
    }

    /// Newest known version: catalog when present, else installed.
    pub fn latest_version(&self) -> Option<&str> {
        self.catalog_copy
            .as_ref()
            .map(|entry| entry.version.as_str())
            .or_else(|| self.installed_version())
    }

    /// Installed, not system-managed, and the catalog knows a different
    /// version. System components never report outdated.
    pub fn outdated(&self) -> bool {
        if self.operational_state != OperationalState::Installed || self.is_system() {
            return false;
        }
        match (self.installed_version(), self.catalog_copy.as_ref()) {
            (Some(installed), Some(entry)) => installed != entry.version,
            _ => false,
        }
    }

    /// Eligible to leave the visible set on the next reconciliation.
    pub fn removable(&self) -> bool {
        self.operational_state == OperationalState::Uninstalled
            && self.host_copies.is_empty()
            && self.catalog_copy.is_none()
    }

    pub fn snapshot(&self) -> ComponentSnapshot {
        ComponentSnapshot {
            identifier: self.identifier.clone(),
            operational_state: self.operational_state,
            enablement_state: self.enablement_state(),
            canonical_host: self.canonical_host.clone(),
            installed_version: self.installed_version().map(str::to_string),
            latest_version: self.latest_version().map(str::to_string),
            outdated: self.outdated(),
            pinned: self.pinned(),
            system_managed: self.is_system(),
            depends_on: self.depends_on().to_vec(),
            pack_members: self.pack_members().to_vec(),
            hosts: {
                let mut hosts: Vec<HostId> = self.host_copies.keys().cloned().collect();
                hosts.sort();
                hosts
            },
        }
    }
}

/// Immutable view of a record handed to consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentSnapshot {
    pub identifier: ComponentId,
    pub operational_state: OperationalState,
    pub enablement_state: EnablementState,
    pub canonical_host: Option<HostId>,
    pub installed_version: Option<String>,
    pub latest_version: Option<String>,
    pub outdated: bool,
    pub pinned: bool,
    pub system_managed: bool,
    pub depends_on: Vec<ComponentId>,
    pub pack_members: Vec<ComponentId>,
    pub hosts: Vec<HostId>,
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
