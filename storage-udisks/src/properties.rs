// SPDX-License-Identifier: GPL-3.0-only

//! Property reads for one block device object

use storage_types::DeviceProperties;
use udisks2::{block::BlockProxy, filesystem::FilesystemProxy};
use zbus::{Connection, zvariant::OwnedObjectPath};

use crate::UDISKS2_SERVICE;
use crate::dbus::bytestring as bs;

const DRIVE_IFACE: &str = "org.freedesktop.UDisks2.Drive";

/// Read the attributes of the block object at `path`.
///
/// Devices without a filesystem only get their usage filled in; nothing else
/// about them is ever looked at.
pub async fn read_block_properties(
    connection: &Connection,
    path: &str,
) -> udisks2::Result<DeviceProperties> {
    let block = BlockProxy::builder(connection).path(path)?.build().await?;

    let usage = block.id_usage().await?;
    if usage != storage_types::FILESYSTEM_USAGE {
        return Ok(DeviceProperties {
            usage,
            ..Default::default()
        });
    }

    let preferred_device = bs::decode_c_string_bytes(&block.preferred_device().await?);
    let device_file = if preferred_device.is_empty() {
        bs::decode_c_string_bytes(&block.device().await?)
    } else {
        preferred_device
    };

    let mount_paths = filesystem_mount_points(connection, path).await;
    let (is_optical, media_compatibility) = match block.drive().await {
        Ok(drive) => drive_media(connection, &drive).await,
        Err(e) => {
            tracing::debug!("No drive for {path}: {e}");
            (false, Vec::new())
        }
    };

    Ok(DeviceProperties {
        usage,
        label: block.id_label().await?,
        device_file,
        uuid: block.id_uuid().await?,
        fs_type: block.id_type().await?,
        size: block.size().await?,
        is_mounted: !mount_paths.is_empty(),
        is_system_internal: block.hint_system().await?,
        mount_paths,
        is_optical,
        media_compatibility,
    })
}

// The Filesystem interface can lag behind IdUsage right after a format; treat
// a missing interface as "not mounted".
async fn filesystem_mount_points(connection: &Connection, path: &str) -> Vec<String> {
    let proxy = match FilesystemProxy::builder(connection).path(path) {
        Ok(builder) => match builder.build().await {
            Ok(proxy) => proxy,
            Err(_) => return Vec::new(),
        },
        Err(_) => return Vec::new(),
    };

    match proxy.mount_points().await {
        Ok(mount_points) => bs::decode_mount_points(mount_points),
        Err(e) => {
            tracing::debug!("Could not read mount points of {path}: {e}");
            Vec::new()
        }
    }
}

async fn drive_media(connection: &Connection, drive: &OwnedObjectPath) -> (bool, Vec<String>) {
    // Loop devices and similar report "/" as their drive.
    if drive.as_str() == "/" {
        return (false, Vec::new());
    }

    let proxy = match zbus::Proxy::new(connection, UDISKS2_SERVICE, drive.as_str(), DRIVE_IFACE)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!("Could not open drive {drive}: {e}");
            return (false, Vec::new());
        }
    };

    let optical = proxy.get_property::<bool>("Optical").await.unwrap_or(false);
    let media = proxy
        .get_property::<Vec<String>>("MediaCompatibility")
        .await
        .unwrap_or_default();

    (optical, media)
}
