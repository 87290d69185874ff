// SPDX-License-Identifier: GPL-3.0-only

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use storage_contracts::DeviceService;
use storage_registry::{DeviceRegistry, RegistryEvent, RegistryEvents, RegistryHandle};
use storage_types::{DeviceIdentity, DeviceInfo, ErrorCode};
use tracing::{debug, info};

use crate::cli::Command;

pub async fn run<S: DeviceService>(
    command: Command,
    registry: DeviceRegistry<S>,
    events: RegistryEvents,
) -> Result<ExitCode> {
    let handle = registry.spawn();

    match command {
        Command::Watch { json } => watch(events, json).await,
        Command::List { json } => list(&handle, json).await,
        Command::Mount { device } => {
            let id = resolve_device(&handle, &device).await?;
            handle.request_mount(id.clone()).await?;
            report(await_completion(events, &id).await?)
        }
        Command::Unmount { device, force } => {
            let id = resolve_device(&handle, &device).await?;
            handle.request_unmount(id.clone(), force).await?;
            report(await_completion(events, &id).await?)
        }
    }
}

async fn watch(mut events: RegistryEvents, json: bool) -> Result<ExitCode> {
    info!("Watching for device changes, press Ctrl-C to stop");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    bail!("device registry stopped");
                };
                println!("{}", render_event(&event, json)?);
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listen for Ctrl-C")?;
                info!("Received shutdown signal");
                return Ok(ExitCode::SUCCESS);
            }
        }
    }
}

async fn list(handle: &RegistryHandle, json: bool) -> Result<ExitCode> {
    let devices = handle.list_devices().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else if devices.is_empty() {
        println!("No filesystem devices");
    } else {
        for device in &devices {
            println!("{}", describe(device));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Accept either a UDisks2 object path or a device file.
async fn resolve_device(handle: &RegistryHandle, device: &str) -> Result<DeviceIdentity> {
    let found = if device.starts_with("/dev/") {
        handle.find_by_device_file(device).await?
    } else {
        handle.lookup(DeviceIdentity::new(device)).await?
    };

    match found {
        Some(info) => Ok(info.identity),
        None => bail!("no filesystem device matches {device}"),
    }
}

async fn await_completion(
    mut events: RegistryEvents,
    id: &DeviceIdentity,
) -> Result<RegistryEvent> {
    while let Some(event) = events.recv().await {
        match &event {
            RegistryEvent::MountCompleted { device, .. }
            | RegistryEvent::UnmountCompleted { device, .. }
                if device.identity == *id =>
            {
                return Ok(event);
            }
            _ => debug!("Ignoring notification while waiting: {event:?}"),
        }
    }

    bail!("device registry stopped before the request completed")
}

fn report(event: RegistryEvent) -> Result<ExitCode> {
    let (code, line) = outcome(&event)?;
    if code.is_ok() {
        println!("{line}");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{line}");
        Ok(ExitCode::FAILURE)
    }
}

fn outcome(event: &RegistryEvent) -> Result<(ErrorCode, String)> {
    let outcome = match event {
        RegistryEvent::MountCompleted {
            device,
            mount_path,
            code: ErrorCode::Ok,
            ..
        } => (ErrorCode::Ok, format!("Mounted {} at {mount_path}", device.name)),
        RegistryEvent::UnmountCompleted {
            device,
            code: ErrorCode::Ok,
            ..
        } => (ErrorCode::Ok, format!("Unmounted {}", device.name)),
        RegistryEvent::MountCompleted { device, code, .. }
        | RegistryEvent::UnmountCompleted { device, code, .. } => {
            (*code, format!("{}: {code}", device.name))
        }
        other => bail!("unexpected notification {other:?}"),
    };
    Ok(outcome)
}

fn describe(device: &DeviceInfo) -> String {
    let mount = device.mount_point.as_deref().unwrap_or("-");
    format!(
        "{:<16} {:<12} {:<8} {:>10}  {:<14} {mount}",
        device.name,
        device.device_file_path,
        device.file_system,
        device.pretty_size(),
        device.kind.display_name(),
    )
}

fn render_event(event: &RegistryEvent, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(event)?);
    }

    let line = match event {
        RegistryEvent::DeviceAdded(device) => format!("added    {}", describe(device)),
        RegistryEvent::DeviceRemoved(device) => format!("removed  {}", describe(device)),
        RegistryEvent::DeviceChanged(device) => format!("changed  {}", describe(device)),
        RegistryEvent::MountCompleted {
            device,
            mount_path,
            code,
            ..
        } => format!("mount    {} {mount_path} ({code})", device.name),
        RegistryEvent::UnmountCompleted { device, code, .. } => {
            format!("unmount  {} ({code})", device.name)
        }
    };
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_types::DeviceKind;

    fn device() -> DeviceInfo {
        DeviceInfo {
            name: "STICK".to_string(),
            identity: DeviceIdentity::new("/org/freedesktop/UDisks2/block_devices/sdb1"),
            uuid: "1234-ABCD".to_string(),
            size_bytes: 4_000_000_000,
            file_system: "vfat".to_string(),
            is_mounted: true,
            mount_point: Some("/media/STICK".to_string()),
            is_system_internal: false,
            device_file_path: "/dev/sdb1".to_string(),
            kind: DeviceKind::UsbDisk,
        }
    }

    #[test]
    fn device_line_shows_file_and_mount_point() {
        let line = describe(&device());
        assert!(line.starts_with("STICK"));
        assert!(line.contains("/dev/sdb1"));
        assert!(line.ends_with("/media/STICK"));
    }

    #[test]
    fn json_events_are_tagged() {
        let json = render_event(&RegistryEvent::DeviceAdded(device()), true).expect("render");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["event"], "device_added");
        assert_eq!(value["device_file_path"], "/dev/sdb1");
    }

    #[test]
    fn failed_mount_reports_the_error_message() {
        let event = RegistryEvent::MountCompleted {
            device: device(),
            mount_path: String::new(),
            code: ErrorCode::Busy,
            detached: false,
        };
        let (code, line) = outcome(&event).expect("completion");
        assert_eq!(code, ErrorCode::Busy);
        assert_eq!(line, "STICK: Device is busy.");
    }

    #[test]
    fn successful_mount_reports_the_path() {
        let event = RegistryEvent::MountCompleted {
            device: device(),
            mount_path: "/media/STICK".to_string(),
            code: ErrorCode::Ok,
            detached: false,
        };
        let (code, line) = outcome(&event).expect("completion");
        assert!(code.is_ok());
        assert_eq!(line, "Mounted STICK at /media/STICK");
    }

    #[test]
    fn device_notifications_are_not_completions() {
        assert!(outcome(&RegistryEvent::DeviceRemoved(device())).is_err());
    }
}
