//! Canonical host selection.
//!
//! When the same component is installed on more than one host, exactly one
//! host's copy represents it to the rest of the system. Selection depends
//! only on the component's declared kinds, topology order, and per-host
//! affinity - never on enablement or operational state - so it is a pure
//! function of its inputs.

use std::collections::HashMap;

use gantry_protocols::{ComponentKind, Host, HostId, InstalledCopy};

/// Pick the canonical host for a component present in `copies`.
///
/// For each declared kind in order, the first topology host whose affinity
/// contains that kind and that holds a copy wins. When no kind matches a
/// present host (or no kinds are declared), the first present non-remote
/// host wins, then any present host in topology order. Returns `None` when
/// no topology host holds a copy - including the upstream-data defect where
/// copies exist only under unknown host ids.
pub fn select_canonical_host<'a>(
    topology: &'a [Host],
    copies: &HashMap<HostId, InstalledCopy>,
    declared_kinds: &[ComponentKind],
) -> Option<&'a HostId> {
    let present: Vec<&Host> = topology
        .iter()
        .filter(|host| copies.contains_key(&host.id))
        .collect();
    if present.is_empty() {
        return None;
    }

    for kind in declared_kinds {
        if let Some(host) = present.iter().find(|host| host.supports(*kind)) {
            return Some(&host.id);
        }
    }

    present
        .iter()
        .find(|host| !host.remote)
        .or_else(|| present.first())
        .map(|host| &host.id)
}

/// Declared kinds for a component: the kinds of the first present host's
/// copy in topology order, so every selector input is deterministic.
pub fn declared_kinds(
    topology: &[Host],
    copies: &HashMap<HostId, InstalledCopy>,
) -> Vec<ComponentKind> {
    topology
        .iter()
        .find_map(|host| copies.get(&host.id))
        .map(|copy| copy.kinds.clone())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "canonical_tests.rs"]
mod tests;
