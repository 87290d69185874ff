// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use storage_types::{DeviceIdentity, DeviceProperties};

use crate::{DeviceEventStream, MountOptions, ServiceError, UnmountOptions};

/// Client surface of the disk management service.
///
/// Implementations are expected to deliver events in arrival order and to keep
/// delivering them for as long as the returned stream is alive.
#[async_trait]
pub trait DeviceService: Send + Sync + 'static {
    /// Start receiving add/remove/change notifications.
    async fn subscribe(&self) -> Result<DeviceEventStream, ServiceError>;

    /// All device objects currently known to the service.
    async fn enumerate(&self) -> Result<Vec<DeviceIdentity>, ServiceError>;

    async fn read_properties(&self, id: &DeviceIdentity) -> Result<DeviceProperties, ServiceError>;

    /// Mount the filesystem on `id`, returning the path it was mounted at.
    async fn mount(&self, id: &DeviceIdentity, options: MountOptions)
    -> Result<String, ServiceError>;

    async fn unmount(&self, id: &DeviceIdentity, options: UnmountOptions)
    -> Result<(), ServiceError>;
}
