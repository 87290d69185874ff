// SPDX-License-Identifier: GPL-3.0-only

//! UDisks2 implementation of the disk management service contract.
//!
//! [`UDisks2Service`] enumerates block devices through the UDisks2 manager, turns
//! ObjectManager and property change signals into [`storage_contracts::DeviceEvent`]s,
//! reads block/filesystem/drive properties and issues filesystem mount/unmount calls.

mod dbus;

pub mod error;
pub mod filesystem;
pub mod manager;
pub mod properties;
pub mod service;

pub use error::{service_error_from_udisks, service_error_from_zbus};
pub use manager::{UDisks2ManagerProxy, device_event_stream_signals};
pub use service::{Bus, UDisks2Service};

pub(crate) const UDISKS2_SERVICE: &str = "org.freedesktop.UDisks2";
pub(crate) const UDISKS2_ROOT: &str = "/org/freedesktop/UDisks2";
pub(crate) const BLOCK_DEVICES_PREFIX: &str = "/org/freedesktop/UDisks2/block_devices/";
pub(crate) const BLOCK_IFACE: &str = "org.freedesktop.UDisks2.Block";
