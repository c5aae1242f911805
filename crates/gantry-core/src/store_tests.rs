use super::*;

fn id(key: &str) -> ComponentId {
    ComponentId::from_key(key)
}

#[tokio::test]
async fn test_unset_flag_reads_enabled() {
    let store = MemoryEnablementStore::new();
    assert_eq!(
        store.enablement_state(&id("pub.a")).await,
        EnablementState::EnabledGlobally
    );
}

#[tokio::test]
async fn test_set_enablement_returns_changed_only() {
    let store = MemoryEnablementStore::new();
    let ids = [id("pub.a"), id("pub.b")];

    let changed = store
        .set_enablement(&ids, EnablementState::DisabledGlobally)
        .await
        .unwrap();
    assert_eq!(changed.len(), 2);

    let changed = store
        .set_enablement(&ids, EnablementState::DisabledGlobally)
        .await
        .unwrap();
    assert!(changed.is_empty());
}

#[tokio::test]
async fn test_reset_drops_stored_flag() {
    let store = MemoryEnablementStore::new();
    store
        .set_enablement(&[id("pub.a")], EnablementState::DisabledGlobally)
        .await
        .unwrap();

    store.reset(&id("pub.a")).await.unwrap();
    assert_eq!(
        store.enablement_state(&id("pub.a")).await,
        EnablementState::EnabledGlobally
    );
}

#[tokio::test]
async fn test_subscribe_sees_batched_change() {
    let store = MemoryEnablementStore::new();
    let mut changes = store.subscribe();

    store
        .set_enablement(
            &[id("pub.a"), id("pub.b")],
            EnablementState::DisabledGlobally,
        )
        .await
        .unwrap();

    let change = changes.recv().await.unwrap();
    assert_eq!(change.identifiers.len(), 2);
    assert_eq!(change.state, EnablementState::DisabledGlobally);
}

#[tokio::test]
async fn test_noop_write_emits_no_change() {
    let store = MemoryEnablementStore::new();
    let mut changes = store.subscribe();

    store
        .set_enablement(&[id("pub.a")], EnablementState::EnabledGlobally)
        .await
        .unwrap();
    assert!(matches!(
        changes.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn test_policy_store_roundtrip() {
    let store = MemoryPolicyStore::default();
    assert_eq!(
        store.auto_update_policy().await,
        AutoUpdatePolicy::Everything
    );

    store
        .set_auto_update_policy(AutoUpdatePolicy::Nothing)
        .await
        .unwrap();
    assert_eq!(store.auto_update_policy().await, AutoUpdatePolicy::Nothing);
}
