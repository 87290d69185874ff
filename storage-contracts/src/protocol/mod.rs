// SPDX-License-Identifier: GPL-3.0-only

pub mod error;
pub mod events;
pub mod options;

pub use error::{ServiceError, map_error};
pub use events::{DeviceEvent, DeviceEventSender, DeviceEventStream, device_event_channel};
pub use options::{MountOptions, UnmountOptions};
