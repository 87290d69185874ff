// SPDX-License-Identifier: GPL-3.0-only

pub mod protocol;
pub mod traits;

pub use protocol::{
    DeviceEvent, DeviceEventSender, DeviceEventStream, MountOptions, ServiceError, UnmountOptions,
    device_event_channel, map_error,
};
pub use traits::DeviceService;
