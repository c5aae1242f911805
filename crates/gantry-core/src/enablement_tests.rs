use super::*;
use gantry_protocols::{Host, InstalledCopy};

fn empty_set() -> ComponentSet {
    ComponentSet::new(vec![Host::local("local", "Local")])
}

fn installed(set: &mut ComponentSet, key: &str, deps: &[&str], packs: &[&str], enabled: bool) {
    let (publisher, name) = key.split_once('.').unwrap();
    let copy = InstalledCopy::new(publisher, name, "1.0.0")
        .with_dependencies(deps.iter().map(|d| ComponentId::from_key(*d)).collect())
        .with_pack_members(packs.iter().map(|p| ComponentId::from_key(*p)).collect());
    set.upsert_installed(&"local".to_string(), copy);

    let record = set.get_mut(&ComponentId::from_key(key)).unwrap();
    record.operational_state = OperationalState::Installed;
    if !enabled {
        record.set_enablement_state(EnablementState::DisabledGlobally);
    }
}

fn ids(keys: &[&str]) -> Vec<ComponentId> {
    keys.iter().map(|k| ComponentId::from_key(*k)).collect()
}

fn sorted_keys(identifiers: &[ComponentId]) -> Vec<&str> {
    let mut keys: Vec<&str> = identifiers.iter().map(|id| id.as_str()).collect();
    keys.sort();
    keys
}

#[test]
fn test_pack_cascade_on_disable() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &[], &["pub.b"], true);
    installed(&mut set, "pub.b", &[], &[], true);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::DisabledGlobally);
    assert_eq!(sorted_keys(&resolution.to_commit), vec!["pub.a", "pub.b"]);
    assert!(!resolution.requires_confirmation());
}

#[test]
fn test_pack_cascade_is_idempotent() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &[], &["pub.b"], false);
    installed(&mut set, "pub.b", &[], &[], false);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::DisabledGlobally);
    assert_eq!(sorted_keys(&resolution.to_commit), vec!["pub.a", "pub.b"]);
    assert!(resolution.dependents.is_empty());
}

#[test]
fn test_pack_cascade_is_transitive() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &[], &["pub.b"], true);
    installed(&mut set, "pub.b", &[], &["pub.c"], true);
    installed(&mut set, "pub.c", &[], &[], true);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::EnabledGlobally);
    assert_eq!(
        sorted_keys(&resolution.to_commit),
        vec!["pub.a", "pub.b", "pub.c"]
    );
}

#[test]
fn test_pack_cycle_terminates() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &[], &["pub.b"], true);
    installed(&mut set, "pub.b", &[], &["pub.a"], true);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::DisabledGlobally);
    assert_eq!(sorted_keys(&resolution.to_commit), vec!["pub.a", "pub.b"]);
}

#[test]
fn test_disable_in_dependency_cycle_collects_all_members() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &["pub.b"], &[], true);
    installed(&mut set, "pub.b", &["pub.c"], &[], true);
    installed(&mut set, "pub.c", &["pub.a"], &[], true);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::DisabledGlobally);
    assert_eq!(sorted_keys(&resolution.to_commit), vec!["pub.a"]);
    assert_eq!(sorted_keys(&resolution.dependents), vec!["pub.b", "pub.c"]);
    assert_eq!(sorted_keys(&resolution.all()), vec!["pub.a", "pub.b", "pub.c"]);
    assert!(resolution.requires_confirmation());
}

#[test]
fn test_disable_never_cascades_to_dependencies() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &["pub.b"], &[], true);
    installed(&mut set, "pub.b", &[], &[], true);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::DisabledGlobally);
    assert_eq!(sorted_keys(&resolution.to_commit), vec!["pub.a"]);
    assert!(resolution.dependents.is_empty());
}

#[test]
fn test_preincluded_dependents_suppress_confirmation() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &["pub.b"], &[], true);
    installed(&mut set, "pub.b", &[], &[], true);

    let resolution = resolve(
        &set,
        &ids(&["pub.b", "pub.a"]),
        &EnablementState::DisabledGlobally,
    );
    assert_eq!(sorted_keys(&resolution.to_commit), vec!["pub.a", "pub.b"]);
    assert!(!resolution.requires_confirmation());
}

#[test]
fn test_enable_pulls_dependency_chain() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &["pub.b"], &[], false);
    installed(&mut set, "pub.b", &["pub.c"], &[], false);
    installed(&mut set, "pub.c", &[], &[], false);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::EnabledGlobally);
    assert_eq!(
        sorted_keys(&resolution.to_commit),
        vec!["pub.a", "pub.b", "pub.c"]
    );
    assert!(!resolution.requires_confirmation());
}

#[test]
fn test_enable_tolerates_dependency_cycle() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &["pub.b"], &[], false);
    installed(&mut set, "pub.b", &["pub.a"], &[], false);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::EnabledGlobally);
    assert_eq!(sorted_keys(&resolution.to_commit), vec!["pub.a", "pub.b"]);
}

#[test]
fn test_unknown_references_are_leaves() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &["ghost.dep"], &["ghost.pack"], false);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::EnabledGlobally);
    assert_eq!(sorted_keys(&resolution.to_commit), vec!["pub.a"]);
}

#[test]
fn test_uninstalled_references_are_leaves() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &["pub.b"], &[], false);
    set.merge_catalog_entry(gantry_protocols::CatalogEntry::new("pub", "b", "1.0.0"));

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::EnabledGlobally);
    assert_eq!(sorted_keys(&resolution.to_commit), vec!["pub.a"]);
}

#[test]
fn test_disabled_dependents_are_not_prompted() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &[], &[], true);
    installed(&mut set, "pub.d", &["pub.a"], &[], false);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::DisabledGlobally);
    assert!(resolution.dependents.is_empty());
}

#[test]
fn test_disabled_intermediate_breaks_dependent_chain() {
    let mut set = empty_set();
    installed(&mut set, "pub.a", &[], &[], true);
    installed(&mut set, "pub.b", &["pub.a"], &[], false);
    installed(&mut set, "pub.c", &["pub.b"], &[], true);

    let resolution = resolve(&set, &ids(&["pub.a"]), &EnablementState::DisabledGlobally);
    assert!(resolution.dependents.is_empty());
}

#[test]
fn test_shared_dependency_prompts_for_every_dependent() {
    let mut set = empty_set();
    installed(&mut set, "pub.lib", &[], &[], true);
    installed(&mut set, "pub.x", &["pub.lib"], &[], true);
    installed(&mut set, "pub.y", &["pub.lib"], &[], true);
    installed(&mut set, "pub.z", &["pub.y"], &[], true);

    let resolution = resolve(&set, &ids(&["pub.lib"]), &EnablementState::DisabledGlobally);
    assert_eq!(
        sorted_keys(&resolution.dependents),
        vec!["pub.x", "pub.y", "pub.z"]
    );
}

#[test]
fn test_resolution_order_is_deterministic() {
    let mut set = empty_set();
    installed(&mut set, "pub.lib", &[], &[], true);
    for key in ["pub.x", "pub.y", "pub.z"] {
        installed(&mut set, key, &["pub.lib"], &[], true);
    }

    let first = resolve(&set, &ids(&["pub.lib"]), &EnablementState::DisabledGlobally);
    let second = resolve(&set, &ids(&["pub.lib"]), &EnablementState::DisabledGlobally);
    assert_eq!(first.dependents, second.dependents);
    assert_eq!(first.to_commit, second.to_commit);
}
