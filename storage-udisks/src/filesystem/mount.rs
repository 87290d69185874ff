// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem mount/unmount operations

use std::collections::HashMap;

use storage_contracts::{MountOptions, UnmountOptions};
use udisks2::filesystem::FilesystemProxy;
use zbus::{Connection, zvariant::Value};

pub(crate) fn mount_call_options(options: &MountOptions) -> HashMap<&str, Value<'_>> {
    let mut opts: HashMap<&str, Value<'_>> = HashMap::new();

    if let Some(fs_type) = options.filesystem_type.as_deref()
        && !fs_type.is_empty()
    {
        opts.insert("fstype", Value::from(fs_type));
    }
    if let Some(joined) = options.joined() {
        opts.insert("options", Value::from(joined));
    }

    opts
}

pub(crate) fn unmount_call_options(
    options: UnmountOptions,
) -> HashMap<&'static str, Value<'static>> {
    let mut opts: HashMap<&str, Value<'_>> = HashMap::new();
    if options.force {
        opts.insert("force", Value::from(true));
    }
    opts
}

/// Mount the filesystem on the block object at `path` and return the mount point.
pub async fn mount_filesystem(
    connection: &Connection,
    path: &str,
    options: &MountOptions,
) -> udisks2::Result<String> {
    let fs_proxy = FilesystemProxy::builder(connection)
        .path(path)?
        .build()
        .await?;

    fs_proxy.mount(mount_call_options(options)).await
}

pub async fn unmount_filesystem(
    connection: &Connection,
    path: &str,
    options: UnmountOptions,
) -> udisks2::Result<()> {
    let fs_proxy = FilesystemProxy::builder(connection)
        .path(path)?
        .build()
        .await?;

    fs_proxy.unmount(unmount_call_options(options)).await
}
