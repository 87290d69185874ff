//! Device kind classification

use crate::device::{DeviceKind, DeviceProperties};

/// Map service attributes to a device kind.
///
/// The checks run in priority order and the first match wins; a device can
/// satisfy several of them (an internal optical drive is an internal disk).
pub fn classify(props: &DeviceProperties) -> DeviceKind {
    if props.is_system_internal {
        DeviceKind::InternalDisk
    } else if props.is_optical {
        DeviceKind::Optical
    } else if props.media_compatibility.iter().any(|m| is_floppy_media(m)) {
        DeviceKind::Floppy
    } else if props.media_compatibility.iter().any(|m| m.contains("flash")) {
        DeviceKind::UsbDisk
    } else {
        DeviceKind::Other
    }
}

// "floppy", "floppy_zip", "floppy_jaz"
fn is_floppy_media(tag: &str) -> bool {
    tag == "floppy" || tag.starts_with("floppy_")
}
