mod common;

use common::{client_named, harness, owner, service_with_cost};
use std::time::Duration;

#[tokio::test]
async fn saved_client_is_visible_before_persistence_resolves() {
    // The in-memory list must reflect the save while the backend call is
    // still parked behind the gate.
    let h = harness().await;
    let data = h.data_service(owner());
    let client = client_named("c1", "Optimistic Co");

    let gate = h.remote.install_gate();
    let task = {
        let data = data.clone();
        let client = client.clone();
        tokio::spawn(async move { data.save_client(client).await })
    };

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if data.clients().await.iter().any(|c| c.id == client.id) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("optimistic state never showed the saved client");
    assert!(data.is_syncing());

    gate.notify_one();
    h.remote.remove_gate();
    task.await.unwrap().unwrap();
    assert!(!data.is_syncing());
}

#[tokio::test]
async fn offline_delete_tombstones_in_memory_and_queues_one_item() {
    let h = harness().await;
    let data = h.data_service(owner());
    let client = client_named("c1", "Soon Gone");
    h.remote
        .clients
        .lock()
        .unwrap()
        .insert("c1".into(), client.clone());
    data.refresh_data().await.unwrap();

    h.monitor.report_link_state(false).await;
    let pending_before = data.pending_count().await.unwrap();

    data.delete_client(&client.id).await.unwrap();

    let clients = data.clients().await;
    let deleted = clients.iter().find(|c| c.id == client.id).unwrap();
    assert!(deleted.deleted_at.is_some());
    assert_eq!(data.pending_count().await.unwrap(), pending_before + 1);

    h.monitor.report_link_state(true).await;
    h.store.drain_queue().await.unwrap();
    assert_eq!(data.pending_count().await.unwrap(), pending_before);
    assert!(h
        .remote
        .clients
        .lock()
        .unwrap()
        .get("c1")
        .unwrap()
        .deleted_at
        .is_some());
}

#[tokio::test]
async fn restore_clears_the_tombstone_in_memory() {
    let h = harness().await;
    let data = h.data_service(owner());
    let client = client_named("c1", "Back Again");
    data.save_client(client.clone()).await.unwrap();
    data.delete_client(&client.id).await.unwrap();

    data.restore_client(&client.id).await.unwrap();

    let clients = data.clients().await;
    let restored = clients.iter().find(|c| c.id == client.id).unwrap();
    assert!(restored.deleted_at.is_none());
    assert!(h
        .remote
        .clients
        .lock()
        .unwrap()
        .get("c1")
        .unwrap()
        .deleted_at
        .is_none());
}

#[tokio::test]
async fn update_service_replaces_the_in_memory_row() {
    let h = harness().await;
    let data = h.data_service(owner());
    data.save_service(service_with_cost("s1", "c1", 50.0))
        .await
        .unwrap();

    data.update_service(service_with_cost("s1", "c1", 75.0))
        .await
        .unwrap();

    let services = data.services().await;
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].cost, 75.0);
}

#[tokio::test]
async fn concurrent_refreshes_collapse_into_one_fetch() {
    let h = harness().await;
    let data = h.data_service(owner());

    let gate = h.remote.install_gate();
    let first = {
        let data = data.clone();
        tokio::spawn(async move { data.refresh_data().await })
    };

    // Let the first refresh take the gate and park inside get_clients.
    tokio::time::sleep(Duration::from_millis(50)).await;
    data.refresh_data().await.unwrap();
    assert_eq!(h.remote.calls().len(), 1);

    h.remote.remove_gate();
    gate.notify_one();
    first.await.unwrap().unwrap();

    // One collapsed refresh: clients, services, expenses — three fetches.
    assert_eq!(h.remote.calls().len(), 3);
}

#[tokio::test]
async fn force_sync_offline_propagates_and_clears_the_syncing_flag() {
    let h = harness().await;
    let data = h.data_service(owner());
    h.monitor.report_link_state(false).await;

    let result = data.force_sync().await;
    assert!(result.is_err());
    assert!(!data.is_syncing());
}

#[tokio::test]
async fn force_sync_refreshes_state_from_the_replaced_mirror() {
    let h = harness().await;
    let data = h.data_service(owner());
    h.remote
        .clients
        .lock()
        .unwrap()
        .insert("c1".into(), client_named("c1", "Authoritative"));

    data.force_sync().await.unwrap();

    let clients = data.clients().await;
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].name, "Authoritative");
}
