// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;

use futures::StreamExt;
use storage_contracts::{DeviceEvent, DeviceEventStream, device_event_channel};
use storage_types::DeviceIdentity;
use tracing::{debug, warn};
use zbus::{
    Connection, MatchRule, Message, MessageStream,
    message::Type as MessageType,
    zvariant::{self, OwnedObjectPath, OwnedValue, Value},
};
use zbus_macros::proxy;

use crate::{BLOCK_DEVICES_PREFIX, BLOCK_IFACE, UDISKS2_ROOT, UDISKS2_SERVICE};

const OBJECT_MANAGER_IFACE: &str = "org.freedesktop.DBus.ObjectManager";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";
const EVENT_QUEUE_DEPTH: usize = 64;

type InterfaceMap = HashMap<String, HashMap<String, OwnedValue>>;

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2/Manager",
    interface = "org.freedesktop.UDisks2.Manager"
)]
pub trait UDisks2Manager {
    fn get_block_devices(
        &self,
        options: HashMap<String, Value<'_>>,
    ) -> zbus::Result<Vec<zvariant::OwnedObjectPath>>;
}

/// The subset of UDisks2 signals the watcher reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UDisksSignal {
    InterfacesAdded { path: String, interfaces: Vec<String> },
    InterfacesRemoved { path: String, interfaces: Vec<String> },
    PropertiesChanged { path: String },
}

/// Normalize a UDisks2 signal into the add/remove/change vocabulary.
///
/// Only block device objects are tracked. Interfaces appearing on or vanishing
/// from an existing block object (a Filesystem after formatting, for example)
/// are reported as a change of that object.
pub(crate) fn event_for_signal(signal: UDisksSignal) -> Option<DeviceEvent> {
    match signal {
        UDisksSignal::InterfacesAdded { path, interfaces } if is_block_object(&path) => {
            let id = DeviceIdentity::new(path);
            if interfaces.iter().any(|i| i == BLOCK_IFACE) {
                Some(DeviceEvent::Added(id))
            } else {
                Some(DeviceEvent::Changed(id))
            }
        }
        UDisksSignal::InterfacesRemoved { path, interfaces } if is_block_object(&path) => {
            let id = DeviceIdentity::new(path);
            if interfaces.iter().any(|i| i == BLOCK_IFACE) {
                Some(DeviceEvent::Removed(id))
            } else {
                Some(DeviceEvent::Changed(id))
            }
        }
        UDisksSignal::PropertiesChanged { path } if is_block_object(&path) => {
            Some(DeviceEvent::Changed(DeviceIdentity::new(path)))
        }
        _ => None,
    }
}

fn is_block_object(path: &str) -> bool {
    path.starts_with(BLOCK_DEVICES_PREFIX)
}

fn parse_signal(message: &Message) -> zbus::Result<Option<UDisksSignal>> {
    let header = message.header();
    let (Some(interface), Some(member)) = (header.interface(), header.member()) else {
        return Ok(None);
    };

    let signal = match (interface.as_str(), member.as_str()) {
        (OBJECT_MANAGER_IFACE, "InterfacesAdded") => {
            let (path, interfaces): (OwnedObjectPath, InterfaceMap) = message.body().deserialize()?;
            UDisksSignal::InterfacesAdded {
                path: path.to_string(),
                interfaces: interfaces.into_keys().collect(),
            }
        }
        (OBJECT_MANAGER_IFACE, "InterfacesRemoved") => {
            let (path, interfaces): (OwnedObjectPath, Vec<String>) =
                message.body().deserialize()?;
            UDisksSignal::InterfacesRemoved {
                path: path.to_string(),
                interfaces,
            }
        }
        (PROPERTIES_IFACE, "PropertiesChanged") => {
            let Some(path) = header.path() else {
                return Ok(None);
            };
            UDisksSignal::PropertiesChanged {
                path: path.to_string(),
            }
        }
        _ => return Ok(None),
    };

    Ok(Some(signal))
}

/// A signal-based event stream for block device add/remove/change.
///
/// All signals from the UDisks2 service are read from one match rule so they
/// reach the receiver in the order the bus delivered them. The match is
/// registered before this function returns, so an enumeration issued afterwards
/// cannot miss an event.
pub async fn device_event_stream_signals(
    connection: &Connection,
) -> zbus::Result<DeviceEventStream> {
    let rule = MatchRule::builder()
        .msg_type(MessageType::Signal)
        .sender(UDISKS2_SERVICE)?
        .path_namespace(UDISKS2_ROOT)?
        .build();
    let mut messages = MessageStream::for_match_rule(rule, connection, None).await?;

    let (sender, receiver) = device_event_channel(EVENT_QUEUE_DEPTH);

    tokio::spawn(async move {
        while let Some(message) = messages.next().await {
            let message = match message {
                Ok(m) => m,
                Err(e) => {
                    warn!("Failed to receive UDisks2 signal: {e}");
                    continue;
                }
            };

            let signal = match parse_signal(&message) {
                Ok(Some(signal)) => signal,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Failed to parse UDisks2 signal args: {e}");
                    continue;
                }
            };

            let Some(event) = event_for_signal(signal) else {
                continue;
            };

            debug!("UDisks2 device event: {event:?}");
            if let Err(e) = sender.send(event).await {
                warn!("Device event receiver dropped: {e}");
                break;
            }
        }
    });

    Ok(receiver)
}
