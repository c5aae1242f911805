//! Lifecycle state machine.
//!
//! Operational state is a pure projection of each host's event stream plus
//! full reconciliation against authoritative installed sets. No state change
//! is ever invented without an event backing it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, info, warn};

use gantry_protocols::{
    ComponentChange, ComponentId, CopyMetadata, HostId, InstalledCopy, LifecycleEvent,
    OperationalState,
};

use crate::registry::{ComponentSet, OperationKind, PendingOperation};

/// Apply one host's lifecycle event to the record set, returning the change
/// to broadcast. Events for system-managed or unknown components are ignored.
pub fn apply_event(
    set: &mut ComponentSet,
    host: &HostId,
    event: LifecycleEvent,
) -> Option<ComponentChange> {
    match event {
        LifecycleEvent::InstallStarted { identifier, source } => {
            if set.get(&identifier).is_some_and(|record| record.is_system()) {
                warn!("Ignoring install event for system component {}", identifier);
                return None;
            }
            set.begin_operation(
                &identifier,
                PendingOperation {
                    kind: OperationKind::Install,
                    host: host.clone(),
                    source,
                },
            );
            let record = set.ensure(&identifier);
            if record.operational_state != OperationalState::Uninstalled {
                return None;
            }
            debug!("Installing {} on {}", identifier, host);
            record.operational_state = OperationalState::Installing;
            Some(ComponentChange::Lifecycle {
                identifier,
                state: OperationalState::Installing,
            })
        }

        LifecycleEvent::InstallFinished {
            identifier,
            copy,
            error,
        } => {
            set.finish_operation(&identifier);
            match copy {
                Some(copy) if error.is_none() => {
                    let copy = preserve_user_metadata(set, host, copy);
                    info!("Installed {} v{} on {}", identifier, copy.version, host);
                    set.upsert_installed(host, copy);
                    let record = set.ensure(&identifier);
                    record.operational_state = OperationalState::Installed;
                    Some(ComponentChange::Lifecycle {
                        identifier,
                        state: OperationalState::Installed,
                    })
                }
                _ => {
                    warn!(
                        "Install of {} on {} failed: {}",
                        identifier,
                        host,
                        error.as_deref().unwrap_or("no copy delivered")
                    );
                    let record = set.get_mut(&identifier)?;
                    record.operational_state = if record.host_copies.is_empty() {
                        OperationalState::Uninstalled
                    } else {
                        OperationalState::Installed
                    };
                    let state = record.operational_state;
                    Some(ComponentChange::Lifecycle { identifier, state })
                }
            }
        }

        LifecycleEvent::UninstallStarted { identifier } => {
            let Some(record) = set.get(&identifier) else {
                warn!("Ignoring uninstall event for unknown component {}", identifier);
                return None;
            };
            if record.is_system() {
                warn!("Ignoring uninstall event for system component {}", identifier);
                return None;
            }
            set.begin_operation(
                &identifier,
                PendingOperation {
                    kind: OperationKind::Uninstall,
                    host: host.clone(),
                    source: None,
                },
            );
            let record = set.ensure(&identifier);
            if record.operational_state != OperationalState::Installed {
                return None;
            }
            debug!("Uninstalling {} from {}", identifier, host);
            record.operational_state = OperationalState::Uninstalling;
            Some(ComponentChange::Lifecycle {
                identifier,
                state: OperationalState::Uninstalling,
            })
        }

        LifecycleEvent::UninstallFinished { identifier, error } => {
            set.finish_operation(&identifier);
            let record = set.get(&identifier)?;
            if let Some(error) = error {
                warn!("Uninstall of {} from {} failed: {}", identifier, host, error);
                let state = if record.host_copies.is_empty() {
                    OperationalState::Uninstalled
                } else {
                    OperationalState::Installed
                };
                set.ensure(&identifier).operational_state = state;
                return Some(ComponentChange::Lifecycle { identifier, state });
            }

            set.remove_installed(host, &identifier);
            let record = set.ensure(&identifier);
            // Defensive: applies from any state, even without a matching
            // Uninstalling, e.g. an uninstall triggered outside this process.
            let state = if record.host_copies.is_empty() {
                info!("Uninstalled {}", identifier);
                OperationalState::Uninstalled
            } else {
                OperationalState::Installed
            };
            record.operational_state = state;
            Some(ComponentChange::Lifecycle { identifier, state })
        }
    }
}

/// A host echoing default metadata never clears a user-set choice on the
/// copy it replaces.
fn preserve_user_metadata(
    set: &ComponentSet,
    host: &HostId,
    mut copy: InstalledCopy,
) -> InstalledCopy {
    if copy.metadata == CopyMetadata::default() {
        if let Some(previous) = set
            .get(&copy.identifier())
            .and_then(|record| record.host_copies.get(host))
        {
            copy.metadata = previous.metadata;
        }
    }
    copy
}

/// Reconcile every record against the authoritative installed set of each
/// host. Records with copies become Installed, absent records with no
/// in-flight operation revert to Uninstalled, and mid-flight states are
/// retained. Orphaned records are dropped afterwards.
pub fn reconcile(set: &mut ComponentSet, installed: Vec<(HostId, Vec<InstalledCopy>)>) {
    let hosts = installed.len();
    let per_host: Vec<(HostId, HashMap<ComponentId, InstalledCopy>)> = installed
        .into_iter()
        .map(|(host, copies)| (host, dedupe_host_copies(copies)))
        .collect();

    let known: Vec<ComponentId> = set.iter().map(|record| record.identifier.clone()).collect();
    for (host, fresh) in &per_host {
        for identifier in &known {
            if !fresh.contains_key(identifier) {
                set.remove_installed(host, identifier);
            }
        }
    }
    for (host, fresh) in per_host {
        for (_, copy) in fresh {
            set.upsert_installed(&host, copy);
        }
    }

    let known: Vec<ComponentId> = set.iter().map(|record| record.identifier.clone()).collect();
    for identifier in &known {
        if set.pending(identifier).is_some() {
            continue;
        }
        let Some(record) = set.get_mut(identifier) else {
            continue;
        };
        let next = if record.host_copies.is_empty() {
            OperationalState::Uninstalled
        } else {
            OperationalState::Installed
        };
        if record.operational_state != next {
            debug!("Reconciled {} to {}", identifier, next);
            record.operational_state = next;
        }
    }

    set.collect_garbage();
    info!("Reconciled {} components across {} hosts", set.len(), hosts);
}

/// Collapse duplicate ids in one host's report, the user copy winning over
/// the system copy.
fn dedupe_host_copies(copies: Vec<InstalledCopy>) -> HashMap<ComponentId, InstalledCopy> {
    let mut map: HashMap<ComponentId, InstalledCopy> = HashMap::new();
    for copy in copies {
        match map.entry(copy.identifier()) {
            Entry::Occupied(mut slot) => {
                if slot.get().system && !copy.system {
                    slot.insert(copy);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(copy);
            }
        }
    }
    map
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
