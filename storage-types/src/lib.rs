// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for the storage device watcher
//!
//! This crate defines the values shared by every layer of the stack:
//!
//! - **storage-udisks**: fills [`DeviceProperties`] from UDisks2 objects
//! - **storage-registry**: builds [`DeviceInfo`] snapshots and reports [`ErrorCode`] outcomes
//! - **storage-watch**: prints and serializes these types
//!
//! Nothing here talks to D-Bus; every function is pure.

pub mod classify;
pub mod common;
pub mod device;
pub mod error_code;

pub use classify::classify;
pub use common::bytes_to_pretty;
pub use device::{DeviceIdentity, DeviceInfo, DeviceKind, DeviceProperties, FILESYSTEM_USAGE};
pub use error_code::ErrorCode;
