// SPDX-License-Identifier: GPL-3.0-only

mod common;

use common::{FakeService, SDB1, SDB2, filesystem, id};
use storage_contracts::{DeviceEvent, ServiceError};
use storage_registry::{DeviceRegistry, RegistryEvent};
use storage_types::ErrorCode;

#[tokio::test]
async fn handle_answers_queries_from_the_registry_task() {
    let service = FakeService::new();
    service.set_device(SDB1, filesystem("/dev/sdb1"));
    let (registry, _events) = DeviceRegistry::new(service.clone()).await;
    let handle = registry.spawn();

    assert_eq!(handle.is_healthy().await, Ok(true));
    assert_eq!(handle.list_devices().await.map(|d| d.len()), Ok(1));
    assert_eq!(
        handle.lookup(id(SDB1)).await.expect("task alive").map(|d| d.name),
        Some("sdb1".to_string())
    );
    assert_eq!(
        handle
            .find_by_device_file("/dev/sdb1")
            .await
            .expect("task alive")
            .map(|d| d.identity),
        Some(id(SDB1))
    );
    assert_eq!(handle.lookup(id(SDB2)).await, Ok(None));
}

#[tokio::test]
async fn handle_requests_produce_completions_and_events_keep_flowing() {
    let service = FakeService::new();
    service.set_device(SDB1, filesystem("/dev/sdb1"));
    let (registry, mut events) = DeviceRegistry::new(service.clone()).await;
    let handle = registry.spawn();

    handle.request_mount(id(SDB1)).await.expect("task alive");
    let Some(RegistryEvent::MountCompleted {
        mount_path, code, ..
    }) = events.recv().await
    else {
        panic!("expected a MountCompleted notification");
    };
    assert_eq!(mount_path, "/media/sdb1");
    assert_eq!(code, ErrorCode::Ok);

    service.set_device(SDB2, filesystem("/dev/sdb2"));
    service.emit(DeviceEvent::Added(id(SDB2))).await;
    let Some(RegistryEvent::DeviceAdded(device)) = events.recv().await else {
        panic!("expected a DeviceAdded notification");
    };
    assert_eq!(device.identity, id(SDB2));
    assert_eq!(handle.list_devices().await.map(|d| d.len()), Ok(2));
}

#[tokio::test]
async fn registry_task_reports_outstanding_work_before_stopping() {
    let service = FakeService::new();
    service.set_device(SDB1, filesystem("/dev/sdb1"));
    let (registry, mut events) = DeviceRegistry::new(service.clone()).await;
    let handle = registry.spawn();
    service.hold_replies();

    handle.request_unmount(id(SDB1), false).await.expect("task alive");
    drop(handle);
    service.release_reply();

    assert!(matches!(
        events.recv().await,
        Some(RegistryEvent::UnmountCompleted { .. })
    ));
    // The task ends and drops its side of the notification channel.
    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn unhealthy_registry_still_answers_through_handle() {
    let service = FakeService::new();
    service.fail_enumeration(ServiceError::Transport("down".to_string()));
    let (registry, _events) = DeviceRegistry::new(service.clone()).await;
    let handle = registry.spawn();

    assert_eq!(handle.is_healthy().await, Ok(false));
    assert_eq!(handle.list_devices().await, Ok(Vec::new()));
}
