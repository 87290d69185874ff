// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use storage_contracts::ServiceError;
use storage_types::{DeviceIdentity, DeviceInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Mount,
    Unmount,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mount => f.write_str("mount"),
            Self::Unmount => f.write_str("unmount"),
        }
    }
}

/// An in-flight mount or unmount call, tagged with the device it targets when
/// it is issued. The reply is matched back through this tag, never by looking
/// at the reply itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    pub identity: DeviceIdentity,
    pub kind: OperationKind,
    /// Registry entry at issue time, if the device was known.
    pub snapshot: Option<DeviceInfo>,
}

/// Reply of the service for one [`PendingOperation`].
#[derive(Debug)]
pub(crate) struct Completion {
    pub(crate) operation: PendingOperation,
    pub(crate) mount_path: String,
    pub(crate) error: Option<ServiceError>,
}

impl Completion {
    pub(crate) fn from_mount(
        operation: PendingOperation,
        result: Result<String, ServiceError>,
    ) -> Self {
        match result {
            Ok(mount_path) => Self {
                operation,
                mount_path,
                error: None,
            },
            Err(e) => Self {
                operation,
                mount_path: String::new(),
                error: Some(e),
            },
        }
    }

    pub(crate) fn from_unmount(
        operation: PendingOperation,
        result: Result<(), ServiceError>,
    ) -> Self {
        Self {
            operation,
            mount_path: String::new(),
            error: result.err(),
        }
    }
}
