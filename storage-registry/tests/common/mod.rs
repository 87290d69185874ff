// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use storage_contracts::{
    DeviceEvent, DeviceEventSender, DeviceEventStream, DeviceService, MountOptions, ServiceError,
    UnmountOptions, device_event_channel,
};
use storage_types::{DeviceIdentity, DeviceProperties, FILESYSTEM_USAGE};
use tokio::sync::Notify;

pub const SDA1: &str = "/org/freedesktop/UDisks2/block_devices/sda1";
pub const SDB1: &str = "/org/freedesktop/UDisks2/block_devices/sdb1";
pub const SDB2: &str = "/org/freedesktop/UDisks2/block_devices/sdb2";

pub fn id(path: &str) -> DeviceIdentity {
    DeviceIdentity::new(path)
}

pub fn filesystem(device_file: &str) -> DeviceProperties {
    DeviceProperties {
        usage: FILESYSTEM_USAGE.to_string(),
        device_file: device_file.to_string(),
        fs_type: "vfat".to_string(),
        size: 4 * 1024 * 1024 * 1024,
        media_compatibility: vec!["flash".to_string()],
        ..Default::default()
    }
}

pub fn swap(device_file: &str) -> DeviceProperties {
    DeviceProperties {
        usage: "other".to_string(),
        device_file: device_file.to_string(),
        fs_type: "swap".to_string(),
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Mount(DeviceIdentity, MountOptions),
    Unmount(DeviceIdentity, UnmountOptions),
}

/// Scriptable stand-in for the disk management service.
#[derive(Default)]
pub struct FakeService {
    properties: Mutex<HashMap<DeviceIdentity, DeviceProperties>>,
    enumerate_error: Mutex<Option<ServiceError>>,
    subscribe_error: Mutex<Option<ServiceError>>,
    events: Mutex<Option<DeviceEventSender>>,
    mount_results: Mutex<VecDeque<Result<String, ServiceError>>>,
    unmount_results: Mutex<VecDeque<Result<(), ServiceError>>>,
    calls: Mutex<Vec<Call>>,
    hold_replies: AtomicBool,
    release: Notify,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_device(&self, path: &str, props: DeviceProperties) {
        self.properties.lock().unwrap().insert(id(path), props);
    }

    pub fn forget_device(&self, path: &str) {
        self.properties.lock().unwrap().remove(&id(path));
    }

    pub fn fail_enumeration(&self, err: ServiceError) {
        *self.enumerate_error.lock().unwrap() = Some(err);
    }

    pub fn fail_subscription(&self, err: ServiceError) {
        *self.subscribe_error.lock().unwrap() = Some(err);
    }

    pub fn push_mount_result(&self, result: Result<String, ServiceError>) {
        self.mount_results.lock().unwrap().push_back(result);
    }

    pub fn push_unmount_result(&self, result: Result<(), ServiceError>) {
        self.unmount_results.lock().unwrap().push_back(result);
    }

    /// Keep mount/unmount replies back until [`FakeService::release_reply`] is called.
    pub fn hold_replies(&self) {
        self.hold_replies.store(true, Ordering::SeqCst);
    }

    pub fn release_reply(&self) {
        self.release.notify_one();
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub async fn emit(&self, event: DeviceEvent) {
        let sender = self
            .events
            .lock()
            .unwrap()
            .clone()
            .expect("registry subscribed");
        sender.send(event).await.expect("registry listening");
    }

    /// End the event subscription, as if the service went away.
    pub fn close_events(&self) {
        self.events.lock().unwrap().take();
    }

    async fn wait_for_release(&self) {
        if self.hold_replies.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl DeviceService for FakeService {
    async fn subscribe(&self) -> Result<DeviceEventStream, ServiceError> {
        if let Some(err) = self.subscribe_error.lock().unwrap().clone() {
            return Err(err);
        }
        let (sender, stream) = device_event_channel(16);
        *self.events.lock().unwrap() = Some(sender);
        Ok(stream)
    }

    async fn enumerate(&self) -> Result<Vec<DeviceIdentity>, ServiceError> {
        if let Some(err) = self.enumerate_error.lock().unwrap().clone() {
            return Err(err);
        }
        let mut ids: Vec<DeviceIdentity> =
            self.properties.lock().unwrap().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn read_properties(&self, id: &DeviceIdentity) -> Result<DeviceProperties, ServiceError> {
        self.properties
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    async fn mount(
        &self,
        id: &DeviceIdentity,
        options: MountOptions,
    ) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push(Call::Mount(id.clone(), options));
        let result = self
            .mount_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("/media/{}", id.basename())));
        self.wait_for_release().await;
        result
    }

    async fn unmount(
        &self,
        id: &DeviceIdentity,
        options: UnmountOptions,
    ) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(Call::Unmount(id.clone(), options));
        let result = self
            .unmount_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        self.wait_for_release().await;
        result
    }
}
