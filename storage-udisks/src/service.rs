// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;

use async_trait::async_trait;
use storage_contracts::{
    DeviceEventStream, DeviceService, MountOptions, ServiceError, UnmountOptions,
};
use storage_types::{DeviceIdentity, DeviceProperties};
use zbus::Connection;

use crate::error::{is_unknown_object, service_error_from_udisks, service_error_from_zbus};
use crate::filesystem::{mount_filesystem, unmount_filesystem};
use crate::manager::{UDisks2ManagerProxy, device_event_stream_signals};
use crate::properties::read_block_properties;

/// Message bus UDisks2 is reached on. UDisks2 always lives on the system bus;
/// the session bus is only useful against a mock service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Bus {
    #[default]
    System,
    Session,
}

/// [`DeviceService`] backed by the UDisks2 D-Bus service.
#[derive(Clone)]
pub struct UDisks2Service {
    connection: Connection,
}

impl UDisks2Service {
    pub async fn connect(bus: Bus) -> Result<Self, ServiceError> {
        let connection = match bus {
            Bus::System => Connection::system().await,
            Bus::Session => Connection::session().await,
        }
        .map_err(service_error_from_zbus)?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl DeviceService for UDisks2Service {
    async fn subscribe(&self) -> Result<DeviceEventStream, ServiceError> {
        device_event_stream_signals(&self.connection)
            .await
            .map_err(service_error_from_zbus)
    }

    async fn enumerate(&self) -> Result<Vec<DeviceIdentity>, ServiceError> {
        let manager = UDisks2ManagerProxy::new(&self.connection)
            .await
            .map_err(service_error_from_zbus)?;
        let paths = manager
            .get_block_devices(HashMap::new())
            .await
            .map_err(service_error_from_zbus)?;

        Ok(paths
            .into_iter()
            .map(|p| DeviceIdentity::new(p.to_string()))
            .collect())
    }

    async fn read_properties(&self, id: &DeviceIdentity) -> Result<DeviceProperties, ServiceError> {
        read_block_properties(&self.connection, id.as_str())
            .await
            .map_err(|e| {
                if is_unknown_object(&e) {
                    ServiceError::NotFound(id.to_string())
                } else {
                    service_error_from_udisks(e)
                }
            })
    }

    async fn mount(
        &self,
        id: &DeviceIdentity,
        options: MountOptions,
    ) -> Result<String, ServiceError> {
        mount_filesystem(&self.connection, id.as_str(), &options)
            .await
            .map_err(service_error_from_udisks)
    }

    async fn unmount(
        &self,
        id: &DeviceIdentity,
        options: UnmountOptions,
    ) -> Result<(), ServiceError> {
        unmount_filesystem(&self.connection, id.as_str(), options)
            .await
            .map_err(service_error_from_udisks)
    }
}
