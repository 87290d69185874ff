// SPDX-License-Identifier: GPL-3.0-only

//! Device registry and event synchronization.
//!
//! [`DeviceRegistry`] owns the map of known filesystem devices. It is filled by one
//! enumeration at construction time and afterwards changes only by applying the
//! add/remove/change events of a [`storage_contracts::DeviceService`]. Mount and
//! unmount requests run concurrently; their replies are fed back into the registry
//! and reported as [`RegistryEvent`]s together with the device changes.

mod handle;
mod notification;
mod pending;
mod registry;

pub use handle::{RegistryError, RegistryHandle};
pub use notification::{RegistryEvent, RegistryEvents};
pub use pending::{OperationKind, PendingOperation};
pub use registry::DeviceRegistry;
