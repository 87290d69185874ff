// SPDX-License-Identifier: GPL-3.0-only

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use serde::Serialize;
use storage_types::{DeviceInfo, ErrorCode};
use tokio::sync::mpsc;

/// Notification published by the registry.
///
/// Device notifications always carry a complete snapshot of the device, never a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    DeviceAdded(DeviceInfo),
    DeviceRemoved(DeviceInfo),
    DeviceChanged(DeviceInfo),
    /// `mount_path` is empty when the mount failed. `detached` is set when the
    /// device was no longer in the registry when the reply arrived; `device` is
    /// then the snapshot taken when the request was issued.
    MountCompleted {
        device: DeviceInfo,
        mount_path: String,
        code: ErrorCode,
        detached: bool,
    },
    UnmountCompleted {
        device: DeviceInfo,
        code: ErrorCode,
        detached: bool,
    },
}

impl RegistryEvent {
    pub fn device(&self) -> &DeviceInfo {
        match self {
            Self::DeviceAdded(device)
            | Self::DeviceRemoved(device)
            | Self::DeviceChanged(device)
            | Self::MountCompleted { device, .. }
            | Self::UnmountCompleted { device, .. } => device,
        }
    }
}

/// Registry notifications in emission order.
///
/// The channel is unbounded: a completion is never dropped because an observer
/// is slow.
pub struct RegistryEvents {
    receiver: mpsc::UnboundedReceiver<RegistryEvent>,
}

impl RegistryEvents {
    pub async fn recv(&mut self) -> Option<RegistryEvent> {
        self.receiver.recv().await
    }

    /// Next notification if one is already queued.
    pub fn try_recv(&mut self) -> Option<RegistryEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for RegistryEvents {
    type Item = RegistryEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

#[derive(Clone)]
pub(crate) struct Notifier {
    sender: mpsc::UnboundedSender<RegistryEvent>,
}

impl Notifier {
    pub(crate) fn emit(&self, event: RegistryEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No observer for registry notifications");
        }
    }
}

pub(crate) fn registry_event_channel() -> (Notifier, RegistryEvents) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Notifier { sender }, RegistryEvents { receiver })
}
