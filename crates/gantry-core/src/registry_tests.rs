use super::*;
use gantry_protocols::{ComponentKind, EnablementState};

fn two_host_set() -> ComponentSet {
    ComponentSet::new(vec![
        Host::local("local", "Local"),
        Host::remote("remote", "Remote"),
    ])
}

#[test]
fn test_upsert_creates_record_and_selects_canonical() {
    let mut set = two_host_set();
    let copy = InstalledCopy::new("pub", "a", "1.0.0").with_kinds(vec![ComponentKind::Ui]);
    set.upsert_installed(&"local".to_string(), copy);

    let record = set.get(&ComponentId::from_key("pub.a")).unwrap();
    assert_eq!(record.canonical_host.as_deref(), Some("local"));
    assert_eq!(record.host_copies.len(), 1);
}

#[test]
fn test_canonical_moves_when_workspace_copy_lands_remotely() {
    let mut set = two_host_set();
    let workspace =
        InstalledCopy::new("pub", "a", "1.0.0").with_kinds(vec![ComponentKind::Workspace]);
    set.upsert_installed(&"local".to_string(), workspace.clone());

    let id = ComponentId::from_key("pub.a");
    assert_eq!(set.get(&id).unwrap().canonical_host.as_deref(), Some("local"));

    set.upsert_installed(&"remote".to_string(), workspace);
    assert_eq!(
        set.get(&id).unwrap().canonical_host.as_deref(),
        Some("remote")
    );
}

#[test]
fn test_remove_installed_recomputes_canonical() {
    let mut set = two_host_set();
    let copy = InstalledCopy::new("pub", "a", "1.0.0").with_kinds(vec![ComponentKind::Web]);
    set.upsert_installed(&"local".to_string(), copy.clone());
    set.upsert_installed(&"remote".to_string(), copy);

    let id = ComponentId::from_key("pub.a");
    set.remove_installed(&"local".to_string(), &id);
    assert_eq!(
        set.get(&id).unwrap().canonical_host.as_deref(),
        Some("remote")
    );

    set.remove_installed(&"remote".to_string(), &id);
    assert_eq!(set.get(&id).unwrap().canonical_host, None);
}

#[test]
fn test_unknown_host_copy_leaves_no_canonical() {
    let mut set = two_host_set();
    set.upsert_installed(
        &"orphan".to_string(),
        InstalledCopy::new("pub", "a", "1.0.0"),
    );
    let record = set.get(&ComponentId::from_key("pub.a")).unwrap();
    assert!(record.canonical_host.is_none());
    assert_eq!(record.host_copies.len(), 1);
}

#[test]
fn test_merge_catalog_entry_creates_uninstalled_record() {
    let mut set = two_host_set();
    set.merge_catalog_entry(CatalogEntry::new("pub", "a", "2.0.0"));

    let record = set.get(&ComponentId::from_key("pub.a")).unwrap();
    assert_eq!(record.operational_state, OperationalState::Uninstalled);
    assert_eq!(record.latest_version(), Some("2.0.0"));
}

#[test]
fn test_pending_operations_tracked_per_identifier() {
    let mut set = two_host_set();
    let id = ComponentId::from_key("pub.a");
    set.begin_operation(
        &id,
        PendingOperation {
            kind: OperationKind::Install,
            host: "local".to_string(),
            source: Some(CatalogEntry::new("pub", "a", "1.0.0")),
        },
    );

    assert_eq!(set.pending(&id).unwrap().kind, OperationKind::Install);
    let finished = set.finish_operation(&id).unwrap();
    assert!(finished.source.is_some());
    assert!(set.pending(&id).is_none());
}

#[test]
fn test_installed_of_publisher_filters_state_and_publisher() {
    let mut set = two_host_set();
    set.upsert_installed(&"local".to_string(), InstalledCopy::new("acme", "a", "1.0.0"));
    set.upsert_installed(&"local".to_string(), InstalledCopy::new("acme", "b", "1.0.0"));
    set.upsert_installed(&"local".to_string(), InstalledCopy::new("other", "c", "1.0.0"));
    for key in ["acme.a", "acme.b", "other.c"] {
        set.get_mut(&ComponentId::from_key(key)).unwrap().operational_state =
            OperationalState::Installed;
    }
    set.merge_catalog_entry(CatalogEntry::new("acme", "z", "1.0.0"));

    let acme = set.installed_of_publisher("Acme");
    assert_eq!(acme.len(), 2);
}

#[test]
fn test_snapshots_sorted_by_identifier() {
    let mut set = two_host_set();
    for name in ["c", "a", "b"] {
        set.upsert_installed(
            &"local".to_string(),
            InstalledCopy::new("pub", name, "1.0.0"),
        );
        let id = ComponentId::new("pub", name);
        let record = set.get_mut(&id).unwrap();
        record.operational_state = OperationalState::Installed;
    }
    set.get_mut(&ComponentId::from_key("pub.b"))
        .unwrap()
        .set_enablement_state(EnablementState::DisabledGlobally);

    let keys: Vec<String> = set
        .snapshots_sorted()
        .iter()
        .map(|snapshot| snapshot.identifier.as_str().to_string())
        .collect();
    assert_eq!(keys, vec!["pub.a", "pub.b", "pub.c"]);
}

#[test]
fn test_collect_garbage_drops_bare_records() {
    let mut set = two_host_set();
    set.merge_catalog_entry(CatalogEntry::new("pub", "kept", "1.0.0"));
    set.ensure(&ComponentId::from_key("pub.bare"));
    assert_eq!(set.len(), 2);

    set.collect_garbage();
    assert_eq!(set.len(), 1);
    assert!(set.contains(&ComponentId::from_key("pub.kept")));
}
