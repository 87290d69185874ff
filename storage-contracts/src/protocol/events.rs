// SPDX-License-Identifier: GPL-3.0-only

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use storage_types::DeviceIdentity;
use tokio::sync::mpsc;

/// Notification emitted by the disk management service about one device object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceEvent {
    Added(DeviceIdentity),
    Removed(DeviceIdentity),
    /// The object changed in some way. This may include gaining or losing a filesystem.
    Changed(DeviceIdentity),
}

impl DeviceEvent {
    pub fn identity(&self) -> &DeviceIdentity {
        match self {
            Self::Added(id) | Self::Removed(id) | Self::Changed(id) => id,
        }
    }
}

pub type DeviceEventSender = mpsc::Sender<DeviceEvent>;

/// Device events in the order the service delivered them.
pub struct DeviceEventStream {
    receiver: mpsc::Receiver<DeviceEvent>,
}

impl DeviceEventStream {
    pub fn new(receiver: mpsc::Receiver<DeviceEvent>) -> Self {
        Self { receiver }
    }

    pub async fn recv(&mut self) -> Option<DeviceEvent> {
        self.receiver.recv().await
    }
}

impl Stream for DeviceEventStream {
    type Item = DeviceEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

pub fn device_event_channel(capacity: usize) -> (DeviceEventSender, DeviceEventStream) {
    let (sender, receiver) = mpsc::channel(capacity);
    (sender, DeviceEventStream::new(receiver))
}
