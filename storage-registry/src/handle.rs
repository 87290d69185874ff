// SPDX-License-Identifier: GPL-3.0-only

use storage_types::{DeviceIdentity, DeviceInfo};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("The device registry task has stopped")]
    Stopped,
}

pub(crate) enum Command {
    IsHealthy(oneshot::Sender<bool>),
    ListDevices(oneshot::Sender<Vec<DeviceInfo>>),
    Lookup(DeviceIdentity, oneshot::Sender<Option<DeviceInfo>>),
    FindByDeviceFile(String, oneshot::Sender<Option<DeviceInfo>>),
    Mount(DeviceIdentity),
    Unmount(DeviceIdentity, bool),
}

/// Cloneable access to a registry running on its own task.
#[derive(Clone)]
pub struct RegistryHandle {
    commands: mpsc::Sender<Command>,
}

impl RegistryHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>) -> Self {
        Self { commands }
    }

    async fn send(&self, command: Command) -> Result<(), RegistryError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RegistryError::Stopped)
    }

    async fn query<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RegistryError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply)).await?;
        response.await.map_err(|_| RegistryError::Stopped)
    }

    pub async fn is_healthy(&self) -> Result<bool, RegistryError> {
        self.query(Command::IsHealthy).await
    }

    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>, RegistryError> {
        self.query(Command::ListDevices).await
    }

    pub async fn lookup(&self, id: DeviceIdentity) -> Result<Option<DeviceInfo>, RegistryError> {
        self.query(|reply| Command::Lookup(id, reply)).await
    }

    pub async fn find_by_device_file(
        &self,
        path: impl Into<String>,
    ) -> Result<Option<DeviceInfo>, RegistryError> {
        let path = path.into();
        self.query(|reply| Command::FindByDeviceFile(path, reply)).await
    }

    /// Queue a mount request. The outcome arrives as a `MountCompleted` notification.
    pub async fn request_mount(&self, id: DeviceIdentity) -> Result<(), RegistryError> {
        self.send(Command::Mount(id)).await
    }

    /// Queue an unmount request. The outcome arrives as an `UnmountCompleted` notification.
    pub async fn request_unmount(
        &self,
        id: DeviceIdentity,
        force: bool,
    ) -> Result<(), RegistryError> {
        self.send(Command::Unmount(id, force)).await
    }
}
