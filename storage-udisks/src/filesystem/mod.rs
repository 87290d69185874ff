// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem actions

pub mod mount;

pub use mount::{mount_filesystem, unmount_filesystem};
