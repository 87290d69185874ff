//! Device models
//!
//! [`DeviceProperties`] is the raw attribute set read from the disk management service for one
//! object. [`DeviceInfo`] is the immutable snapshot built from it and handed to observers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bytes_to_pretty;
use crate::classify::classify;

/// Usage kind reported for block devices that carry a mountable filesystem.
pub const FILESYSTEM_USAGE: &str = "filesystem";

/// Service-assigned handle naming one device object
/// (e.g. "/org/freedesktop/UDisks2/block_devices/sdb1").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceIdentity(String);

impl DeviceIdentity {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment of the identity ("sdb1" for ".../block_devices/sdb1").
    pub fn basename(&self) -> &str {
        trailing_segment(&self.0)
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DeviceIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of storage device, used for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    InternalDisk,
    UsbDisk,
    Floppy,
    Optical,
    #[default]
    Other,
}

impl DeviceKind {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::InternalDisk => "Internal disk",
            Self::UsbDisk => "USB disk",
            Self::Floppy => "Floppy disk",
            Self::Optical => "Optical disk",
            Self::Other => "Unknown device",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Attributes of one device object as reported by the disk management service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    /// Usage kind ("filesystem", "crypto", "raid", "other", or empty)
    pub usage: String,

    /// Volume label, may be empty
    pub label: String,

    /// Device file (e.g., "/dev/sdb1")
    pub device_file: String,

    /// Filesystem UUID, may be empty
    pub uuid: String,

    /// Filesystem type (e.g., "vfat"), may be empty
    pub fs_type: String,

    /// Capacity in bytes
    pub size: u64,

    pub is_mounted: bool,

    /// Whether the device is internal fixed storage rather than removable media
    pub is_system_internal: bool,

    /// Active mount paths, in the order the service reports them
    pub mount_paths: Vec<String>,

    /// Whether the backing drive is an optical drive
    pub is_optical: bool,

    /// Media compatibility tags of the backing drive (e.g., "flash_sd", "floppy")
    pub media_compatibility: Vec<String>,
}

impl DeviceProperties {
    pub fn has_filesystem(&self) -> bool {
        self.usage == FILESYSTEM_USAGE
    }
}

/// Snapshot of one storage device (single source of truth for observers)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Display label; the device file name when the volume has no label
    pub name: String,

    pub identity: DeviceIdentity,

    /// Filesystem UUID, may be empty
    pub uuid: String,

    pub size_bytes: u64,

    /// Filesystem type, may be empty
    pub file_system: String,

    pub is_mounted: bool,

    /// First active mount path. Only the first one is surfaced when the
    /// filesystem is mounted in several places.
    pub mount_point: Option<String>,

    pub is_system_internal: bool,

    /// Device file (e.g., "/dev/sdb1")
    pub device_file_path: String,

    pub kind: DeviceKind,
}

impl DeviceInfo {
    /// Build a snapshot from service attributes.
    ///
    /// Returns `None` unless the device usage is "filesystem"; raw disks, partition
    /// tables, swap and crypto containers never enter the registry.
    pub fn from_properties(identity: DeviceIdentity, props: &DeviceProperties) -> Option<Self> {
        if !props.has_filesystem() {
            return None;
        }

        let name = if props.label.is_empty() {
            trailing_segment(&props.device_file).to_string()
        } else {
            props.label.clone()
        };

        let mount_point = if props.is_mounted {
            props.mount_paths.first().cloned()
        } else {
            None
        };

        Some(Self {
            name,
            identity,
            uuid: props.uuid.clone(),
            size_bytes: props.size,
            file_system: props.fs_type.clone(),
            is_mounted: props.is_mounted,
            mount_point,
            is_system_internal: props.is_system_internal,
            device_file_path: props.device_file.clone(),
            kind: classify(props),
        })
    }

    /// Placeholder for an identity the registry has never seen.
    pub fn detached(identity: DeviceIdentity) -> Self {
        Self {
            name: identity.basename().to_string(),
            identity,
            uuid: String::new(),
            size_bytes: 0,
            file_system: String::new(),
            is_mounted: false,
            mount_point: None,
            is_system_internal: false,
            device_file_path: String::new(),
            kind: DeviceKind::Other,
        }
    }

    pub fn pretty_size(&self) -> String {
        bytes_to_pretty(&self.size_bytes, false)
    }
}

fn trailing_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
