//! The owned collection of component records.
//!
//! All mutation of the record set flows through this type: lifecycle event
//! application, per-host reconciliation, catalog merging, and enablement
//! commits. Consumers only ever see snapshots.

use std::collections::HashMap;

use tracing::warn;

use gantry_protocols::{CatalogEntry, ComponentId, Host, HostId, InstalledCopy, OperationalState};

use crate::canonical::{declared_kinds, select_canonical_host};
use crate::record::{ComponentRecord, ComponentSnapshot};

/// An install or uninstall that has started but not yet finished.
#[derive(Debug, Clone)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub host: HostId,
    /// Catalog source of an in-flight install, kept for display.
    pub source: Option<CatalogEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Install,
    Uninstall,
}

/// Identifier-keyed arena of component records plus the in-flight operation
/// table.
#[derive(Debug)]
pub struct ComponentSet {
    topology: Vec<Host>,
    records: HashMap<ComponentId, ComponentRecord>,
    in_flight: HashMap<ComponentId, PendingOperation>,
}

impl ComponentSet {
    pub fn new(topology: Vec<Host>) -> Self {
        Self {
            topology,
            records: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }

    pub fn topology(&self) -> &[Host] {
        &self.topology
    }

    pub fn host(&self, id: &HostId) -> Option<&Host> {
        self.topology.iter().find(|host| &host.id == id)
    }

    pub fn get(&self, identifier: &ComponentId) -> Option<&ComponentRecord> {
        self.records.get(identifier)
    }

    pub(crate) fn get_mut(&mut self, identifier: &ComponentId) -> Option<&mut ComponentRecord> {
        self.records.get_mut(identifier)
    }

    /// The record for an identifier, created uninstalled when first observed.
    pub(crate) fn ensure(&mut self, identifier: &ComponentId) -> &mut ComponentRecord {
        self.records
            .entry(identifier.clone())
            .or_insert_with(|| ComponentRecord::new(identifier.clone()))
    }

    pub fn contains(&self, identifier: &ComponentId) -> bool {
        self.records.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentRecord> {
        self.records.values()
    }

    /// Installed records belonging to a publisher.
    pub fn installed_of_publisher(&self, publisher: &str) -> Vec<&ComponentRecord> {
        let publisher = publisher.to_lowercase();
        self.records
            .values()
            .filter(|record| {
                record.operational_state == OperationalState::Installed
                    && record.identifier.publisher() == publisher
            })
            .collect()
    }

    /// Ordered snapshots: by identifier, enabled before disabled when
    /// identifiers tie.
    pub fn snapshots_sorted(&self) -> Vec<ComponentSnapshot> {
        let mut snapshots: Vec<ComponentSnapshot> =
            self.records.values().map(ComponentRecord::snapshot).collect();
        snapshots.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        snapshots
    }

    pub fn pending(&self, identifier: &ComponentId) -> Option<&PendingOperation> {
        self.in_flight.get(identifier)
    }

    pub(crate) fn begin_operation(&mut self, identifier: &ComponentId, operation: PendingOperation) {
        self.in_flight.insert(identifier.clone(), operation);
    }

    pub(crate) fn finish_operation(&mut self, identifier: &ComponentId) -> Option<PendingOperation> {
        self.in_flight.remove(identifier)
    }

    /// Insert or replace one host's installed copy and recompute the
    /// canonical host.
    pub(crate) fn upsert_installed(&mut self, host: &HostId, copy: InstalledCopy) {
        let identifier = copy.identifier();
        let record = self.ensure(&identifier);
        record.host_copies.insert(host.clone(), copy);
        self.recompute_canonical(&identifier);
    }

    /// Remove one host's installed copy and recompute the canonical host.
    pub(crate) fn remove_installed(&mut self, host: &HostId, identifier: &ComponentId) {
        if let Some(record) = self.records.get_mut(identifier) {
            record.host_copies.remove(host);
            self.recompute_canonical(identifier);
        }
    }

    /// Attach or refresh catalog metadata for an identifier.
    pub(crate) fn merge_catalog_entry(&mut self, entry: CatalogEntry) {
        let identifier = entry.identifier.clone();
        self.ensure(&identifier).set_catalog_copy(entry);
    }

    pub(crate) fn recompute_canonical(&mut self, identifier: &ComponentId) {
        let Some(record) = self.records.get_mut(identifier) else {
            return;
        };
        if record.host_copies.is_empty() {
            record.canonical_host = None;
            return;
        }
        let kinds = declared_kinds(&self.topology, &record.host_copies);
        match select_canonical_host(&self.topology, &record.host_copies, &kinds) {
            Some(host) => record.canonical_host = Some(host.clone()),
            None => {
                warn!(
                    "No canonical host for {}: copies reported by unknown hosts",
                    record.identifier
                );
                record.canonical_host = None;
            }
        }
    }

    /// Drop records that no longer reference anything.
    pub(crate) fn collect_garbage(&mut self) {
        self.records.retain(|_, record| !record.removable());
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
