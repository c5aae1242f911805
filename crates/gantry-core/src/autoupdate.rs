//! Auto-update pin set.
//!
//! Pinning is a per-copy metadata flag; these are the derived exception
//! lists against the global policy, plus the policy rules for per-component
//! and per-publisher toggles.

use gantry_protocols::{
    AutoUpdatePolicy, AutoUpdateTarget, ComponentError, ComponentId, OperationalState,
};

use crate::registry::ComponentSet;

/// Components pinned against an enabled policy. Under a policy of `Nothing`
/// there is no additional exception to list.
pub fn disabled_auto_update_components(
    set: &ComponentSet,
    policy: AutoUpdatePolicy,
) -> Vec<ComponentId> {
    if !policy.updates_by_default() {
        return Vec::new();
    }
    let mut identifiers: Vec<ComponentId> = set
        .iter()
        .filter(|record| {
            record.operational_state == OperationalState::Installed && record.pinned()
        })
        .map(|record| record.identifier.clone())
        .collect();
    identifiers.sort();
    identifiers
}

/// Components explicitly opted in under a policy of `Nothing`; the symmetric
/// complement of [`disabled_auto_update_components`].
pub fn enabled_auto_update_components(
    set: &ComponentSet,
    policy: AutoUpdatePolicy,
) -> Vec<ComponentId> {
    if policy.updates_by_default() {
        return Vec::new();
    }
    let mut identifiers: Vec<ComponentId> = set
        .iter()
        .filter(|record| {
            record.operational_state == OperationalState::Installed
                && record.auto_update_mark() == Some(true)
        })
        .map(|record| record.identifier.clone())
        .collect();
    identifiers.sort();
    identifiers
}

/// Publisher-level targets are only accepted while the global policy is
/// `Nothing`; under an enabled policy, exceptions are tracked per component.
pub fn validate_target(
    policy: AutoUpdatePolicy,
    target: &AutoUpdateTarget,
) -> Result<(), ComponentError> {
    if policy.updates_by_default() && matches!(target, AutoUpdateTarget::Publisher(_)) {
        return Err(ComponentError::NotAllowed(
            "publisher-level auto-update targets require the global policy to be off".to_string(),
        ));
    }
    Ok(())
}

/// The installed identifiers a target names: the component itself, or every
/// installed component of a publisher.
pub fn expand_target(set: &ComponentSet, target: &AutoUpdateTarget) -> Vec<ComponentId> {
    match target {
        AutoUpdateTarget::Component(identifier) => vec![identifier.clone()],
        AutoUpdateTarget::Publisher(publisher) => {
            let mut identifiers: Vec<ComponentId> = set
                .installed_of_publisher(publisher)
                .into_iter()
                .map(|record| record.identifier.clone())
                .collect();
            identifiers.sort();
            identifiers
        }
    }
}

#[cfg(test)]
#[path = "autoupdate_tests.rs"]
mod tests;
