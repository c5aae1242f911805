//! Enablement resolution.
//!
//! Given a requested enablement change, computes the full set of components
//! that must change with it: the transitive pack cascade in both directions,
//! the dependency closure when enabling, and the enabled-dependents closure
//! when disabling. Every traversal runs over explicit visited sets and
//! queues, so dependency cycles terminate, and unknown or uninstalled
//! references are leaves with no further edges.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use gantry_protocols::{ComponentId, EnablementState, OperationalState};

use crate::registry::ComponentSet;

/// Outcome of resolving a requested enablement change.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Requested identifiers plus their transitive pack members plus, for an
    /// enable target, the dependency closure. Committed unconditionally.
    pub to_commit: Vec<ComponentId>,
    /// Enabled dependents outside the working set, sorted. Disabling them
    /// requires a single confirmation covering all of them.
    pub dependents: Vec<ComponentId>,
}

impl Resolution {
    pub fn requires_confirmation(&self) -> bool {
        !self.dependents.is_empty()
    }

    /// The full closure: working set plus dependents.
    pub fn all(&self) -> Vec<ComponentId> {
        let mut all = self.to_commit.clone();
        all.extend(self.dependents.iter().cloned());
        all
    }
}

/// Resolve the consequences of applying `target` to `requested`.
///
/// The requested identifiers are always part of the working set, even inside
/// cycles; expansion only ever adds installed records.
pub fn resolve(
    set: &ComponentSet,
    requested: &[ComponentId],
    target: &EnablementState,
) -> Resolution {
    let mut working: Vec<ComponentId> = Vec::new();
    let mut visited: HashSet<ComponentId> = HashSet::new();
    let mut queue: VecDeque<ComponentId> = VecDeque::new();

    for identifier in requested {
        if visited.insert(identifier.clone()) {
            working.push(identifier.clone());
            queue.push_back(identifier.clone());
        }
    }

    // Pack cascade, both directions of target. A pack member's own pack is
    // pulled in as well; never prompts.
    while let Some(identifier) = queue.pop_front() {
        let Some(record) = set.get(&identifier) else {
            continue;
        };
        for member in record.pack_members() {
            if visited.contains(member) || !expandable(set, member) {
                continue;
            }
            visited.insert(member.clone());
            working.push(member.clone());
            queue.push_back(member.clone());
        }
    }

    let dependents = if target.is_enabled() {
        // Enabling pulls in everything the working set needs to function.
        let mut queue: VecDeque<ComponentId> = working.iter().cloned().collect();
        while let Some(identifier) = queue.pop_front() {
            let Some(record) = set.get(&identifier) else {
                continue;
            };
            for dependency in record.depends_on() {
                if visited.contains(dependency) || !expandable(set, dependency) {
                    continue;
                }
                visited.insert(dependency.clone());
                working.push(dependency.clone());
                queue.push_back(dependency.clone());
            }
        }
        Vec::new()
    } else {
        // Disabling threatens enabled dependents; it never cascades to the
        // working set's own dependencies.
        enabled_dependents_closure(set, &working, &mut visited)
    };

    debug!(
        "Resolved enablement change: {} to commit, {} dependents",
        working.len(),
        dependents.len()
    );
    Resolution {
        to_commit: working,
        dependents,
    }
}

/// Enabled components outside `working` whose dependencies transitively
/// reach it, walking reverse edges contributed by enabled records only.
fn enabled_dependents_closure(
    set: &ComponentSet,
    working: &[ComponentId],
    visited: &mut HashSet<ComponentId>,
) -> Vec<ComponentId> {
    let mut reverse: HashMap<&ComponentId, Vec<&ComponentId>> = HashMap::new();
    for record in set.iter() {
        if record.operational_state == OperationalState::Uninstalled || !record.is_enabled() {
            continue;
        }
        for dependency in record.depends_on() {
            reverse.entry(dependency).or_default().push(&record.identifier);
        }
    }

    let mut dependents: Vec<ComponentId> = Vec::new();
    let mut queue: VecDeque<ComponentId> = working.iter().cloned().collect();
    while let Some(identifier) = queue.pop_front() {
        let Some(parents) = reverse.get(&identifier) else {
            continue;
        };
        for parent in parents {
            if visited.insert((*parent).clone()) {
                dependents.push((*parent).clone());
                queue.push_back((*parent).clone());
            }
        }
    }

    dependents.sort();
    dependents
}

/// Expansion only follows references to records that are actually installed;
/// anything else is a leaf.
fn expandable(set: &ComponentSet, identifier: &ComponentId) -> bool {
    set.get(identifier)
        .is_some_and(|record| record.operational_state != OperationalState::Uninstalled)
}

#[cfg(test)]
#[path = "enablement_tests.rs"]
mod tests;
