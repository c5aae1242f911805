use super::*;

fn topology() -> Vec<Host> {
    vec![Host::local("local", "Local"), Host::remote("remote", "Remote")]
}

fn copies_on(hosts: &[&str]) -> HashMap<HostId, InstalledCopy> {
    hosts
        .iter()
        .map(|host| (host.to_string(), InstalledCopy::new("pub", "a", "1.0.0")))
        .collect()
}

#[test]
fn test_workspace_kind_prefers_remote() {
    let topology = topology();
    let copies = copies_on(&["local", "remote"]);
    let canonical =
        select_canonical_host(&topology, &copies, &[ComponentKind::Workspace]).unwrap();
    assert_eq!(canonical, "remote");
}

#[test]
fn test_ui_before_workspace_prefers_local() {
    let topology = topology();
    let copies = copies_on(&["local", "remote"]);
    let canonical = select_canonical_host(
        &topology,
        &copies,
        &[ComponentKind::Ui, ComponentKind::Workspace],
    )
    .unwrap();
    assert_eq!(canonical, "local");
}

#[test]
fn test_web_kind_prefers_local_by_topology_order() {
    let topology = topology();
    let copies = copies_on(&["local", "remote"]);
    let canonical = select_canonical_host(&topology, &copies, &[ComponentKind::Web]).unwrap();
    assert_eq!(canonical, "local");
}

#[test]
fn test_workspace_kind_falls_back_to_local_only_copy() {
    let topology = topology();
    let copies = copies_on(&["local"]);
    let canonical =
        select_canonical_host(&topology, &copies, &[ComponentKind::Workspace]).unwrap();
    assert_eq!(canonical, "local");
}

#[test]
fn test_ui_kind_falls_back_to_remote_only_copy() {
    let topology = topology();
    let copies = copies_on(&["remote"]);
    let canonical = select_canonical_host(&topology, &copies, &[ComponentKind::Ui]).unwrap();
    assert_eq!(canonical, "remote");
}

#[test]
fn test_no_declared_kinds_prefers_non_remote() {
    let topology = topology();
    let copies = copies_on(&["local", "remote"]);
    let canonical = select_canonical_host(&topology, &copies, &[]).unwrap();
    assert_eq!(canonical, "local");
}

#[test]
fn test_unknown_host_ids_yield_none() {
    let topology = topology();
    let copies = copies_on(&["orphan"]);
    assert!(select_canonical_host(&topology, &copies, &[ComponentKind::Ui]).is_none());
}

#[test]
fn test_empty_copies_yield_none() {
    let topology = topology();
    let copies = HashMap::new();
    assert!(select_canonical_host(&topology, &copies, &[ComponentKind::Ui]).is_none());
}

#[test]
fn test_selection_is_deterministic() {
    let topology = topology();
    let copies = copies_on(&["local", "remote"]);
    let kinds = [ComponentKind::Web, ComponentKind::Workspace];
    let first = select_canonical_host(&topology, &copies, &kinds);
    let second = select_canonical_host(&topology, &copies, &kinds);
    assert_eq!(first, second);
}

#[test]
fn test_topology_order_breaks_affinity_ties() {
    let topology = vec![
        Host::local("laptop", "Laptop"),
        Host::local("desktop", "Desktop"),
    ];
    let copies = copies_on(&["desktop", "laptop"]);
    let canonical = select_canonical_host(&topology, &copies, &[ComponentKind::Ui]).unwrap();
    assert_eq!(canonical, "laptop");
}

#[test]
fn test_declared_kinds_from_first_present_copy() {
    let topology = topology();
    let mut copies = HashMap::new();
    copies.insert(
        "remote".to_string(),
        InstalledCopy::new("pub", "a", "1.0.0").with_kinds(vec![ComponentKind::Workspace]),
    );
    assert_eq!(
        declared_kinds(&topology, &copies),
        vec![ComponentKind::Workspace]
    );

    copies.insert(
        "local".to_string(),
        InstalledCopy::new("pub", "a", "1.0.0").with_kinds(vec![ComponentKind::Ui]),
    );
    assert_eq!(declared_kinds(&topology, &copies), vec![ComponentKind::Ui]);
}
