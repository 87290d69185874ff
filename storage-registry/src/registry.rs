// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::sync::Arc;

use storage_contracts::{
    DeviceEvent, DeviceEventStream, DeviceService, MountOptions, UnmountOptions, map_error,
};
use storage_types::{DeviceIdentity, DeviceInfo};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::handle::{Command, RegistryHandle};
use crate::notification::{Notifier, RegistryEvent, RegistryEvents, registry_event_channel};
use crate::pending::{Completion, OperationKind, PendingOperation};

const COMMAND_QUEUE_DEPTH: usize = 32;

enum Input {
    Event(Option<DeviceEvent>),
    Completion(Completion),
    Command(Option<Command>),
}

/// Map of known filesystem devices, synchronized with a [`DeviceService`].
///
/// All state lives on whichever task drives the registry; observers only ever
/// receive clones of the entries.
pub struct DeviceRegistry<S: DeviceService> {
    service: Arc<S>,
    devices: HashMap<DeviceIdentity, DeviceInfo>,
    healthy: bool,
    service_events: Option<DeviceEventStream>,
    mount_options: MountOptions,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    notifier: Notifier,
}

impl<S: DeviceService> DeviceRegistry<S> {
    /// Subscribe to the service and load every filesystem device it knows about.
    ///
    /// This waits for the full enumeration. If subscribing or enumerating fails the
    /// registry is returned empty and unhealthy; it will never track a device.
    pub async fn new(service: Arc<S>) -> (Self, RegistryEvents) {
        Self::with_mount_options(service, MountOptions::default()).await
    }

    /// Like [`DeviceRegistry::new`], with the options sent along with every mount request.
    pub async fn with_mount_options(
        service: Arc<S>,
        mount_options: MountOptions,
    ) -> (Self, RegistryEvents) {
        let (notifier, events) = registry_event_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let mut registry = Self {
            service,
            devices: HashMap::new(),
            healthy: false,
            service_events: None,
            mount_options,
            completions_tx,
            completions_rx,
            in_flight: 0,
            notifier,
        };

        let subscription = match registry.service.subscribe().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to subscribe to device events: {e}");
                return (registry, events);
            }
        };

        let identities = match registry.service.enumerate().await {
            Ok(identities) => identities,
            Err(e) => {
                warn!("Failed to enumerate devices: {e}");
                return (registry, events);
            }
        };

        registry.healthy = true;
        registry.service_events = Some(subscription);

        for id in identities {
            if let Some(device) = registry.fetch_info(&id).await {
                debug!("Storage device detected: {id}");
                registry.devices.insert(id, device);
            }
        }

        info!(
            "Device registry ready with {} filesystem device(s)",
            registry.devices.len()
        );

        (registry, events)
    }

    /// True iff the initial enumeration succeeded.
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Snapshot of every known device, ordered by identity.
    pub fn list_devices(&self) -> Vec<DeviceInfo> {
        let mut devices: Vec<DeviceInfo> = self.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.identity.cmp(&b.identity));
        devices
    }

    pub fn lookup(&self, id: &DeviceIdentity) -> Option<DeviceInfo> {
        self.devices.get(id).cloned()
    }

    /// Find a device by its device file (e.g. "/dev/sdb1").
    pub fn find_by_device_file(&self, path: &str) -> Option<DeviceInfo> {
        self.devices
            .values()
            .find(|d| d.device_file_path == path)
            .cloned()
    }

    /// Number of mount/unmount calls whose reply has not been processed yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Read the device from the service. `None` when it carries no filesystem or
    /// cannot be read.
    pub async fn fetch_info(&self, id: &DeviceIdentity) -> Option<DeviceInfo> {
        match self.service.read_properties(id).await {
            Ok(props) => {
                let device = DeviceInfo::from_properties(id.clone(), &props);
                if device.is_none() {
                    debug!("Skipping {id}: usage {:?}", props.usage);
                }
                device
            }
            Err(e) => {
                debug!("Could not read properties of {id}: {e}");
                None
            }
        }
    }

    /// Apply one service event to the map and publish the resulting notification.
    pub async fn apply(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Added(id) => {
                if let Some(device) = self.fetch_info(&id).await {
                    self.upsert(id, device);
                }
            }
            DeviceEvent::Changed(id) => match self.fetch_info(&id).await {
                Some(device) => self.upsert(id, device),
                // The device lost its filesystem (or vanished): it is no longer tracked.
                None => self.erase(&id),
            },
            DeviceEvent::Removed(id) => self.erase(&id),
        }
    }

    fn upsert(&mut self, id: DeviceIdentity, device: DeviceInfo) {
        match self.devices.insert(id, device.clone()) {
            None => {
                info!("Device added: {}", device.identity);
                self.notifier.emit(RegistryEvent::DeviceAdded(device));
            }
            Some(_) => {
                debug!("Device changed: {}", device.identity);
                self.notifier.emit(RegistryEvent::DeviceChanged(device));
            }
        }
    }

    fn erase(&mut self, id: &DeviceIdentity) {
        if let Some(device) = self.devices.remove(id) {
            info!("Device removed: {id}");
            self.notifier.emit(RegistryEvent::DeviceRemoved(device));
        }
    }

    fn pending(&self, identity: DeviceIdentity, kind: OperationKind) -> PendingOperation {
        let snapshot = self.devices.get(&identity).cloned();
        PendingOperation {
            identity,
            kind,
            snapshot,
        }
    }

    /// Issue a mount call and return without waiting for it.
    ///
    /// The reply is reported as [`RegistryEvent::MountCompleted`]. The stored entry
    /// is left alone; a later change event carries the new mount state.
    pub fn request_mount(&mut self, id: DeviceIdentity) {
        let operation = self.pending(id, OperationKind::Mount);
        let service = Arc::clone(&self.service);
        let options = self.mount_options.clone();
        let completions = self.completions_tx.clone();

        debug!("Requesting mount of {}", operation.identity);
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = service.mount(&operation.identity, options).await;
            if completions
                .send(Completion::from_mount(operation, result))
                .is_err()
            {
                debug!("Registry dropped before a mount reply arrived");
            }
        });
    }

    /// Issue an unmount call and return without waiting for it.
    pub fn request_unmount(&mut self, id: DeviceIdentity, force: bool) {
        let operation = self.pending(id, OperationKind::Unmount);
        let service = Arc::clone(&self.service);
        let completions = self.completions_tx.clone();

        debug!("Requesting unmount of {} (force: {force})", operation.identity);
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = service
                .unmount(&operation.identity, UnmountOptions { force })
                .await;
            if completions
                .send(Completion::from_unmount(operation, result))
                .is_err()
            {
                debug!("Registry dropped before an unmount reply arrived");
            }
        });
    }

    fn complete(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        let Completion {
            operation,
            mount_path,
            error,
        } = completion;
        let code = map_error(error.as_ref());
        if let Some(e) = &error {
            warn!("Failed to {} {}: {e}", operation.kind, operation.identity);
        }

        let (device, detached) = match self.devices.get(&operation.identity) {
            Some(device) => (device.clone(), false),
            None => {
                warn!(
                    "{} reply for {} arrived after the device left the registry",
                    operation.kind, operation.identity
                );
                let device = operation
                    .snapshot
                    .unwrap_or_else(|| DeviceInfo::detached(operation.identity.clone()));
                (device, true)
            }
        };

        let event = match operation.kind {
            OperationKind::Mount => RegistryEvent::MountCompleted {
                device,
                mount_path,
                code,
                detached,
            },
            OperationKind::Unmount => RegistryEvent::UnmountCompleted {
                device,
                code,
                detached,
            },
        };
        self.notifier.emit(event);
    }

    async fn next_input(
        &mut self,
        commands: Option<&mut mpsc::Receiver<Command>>,
    ) -> Option<Input> {
        let accepting = commands.is_some();
        let listening = self.service_events.is_some();
        let waiting = self.in_flight > 0;

        tokio::select! {
            command = recv_command(commands), if accepting => Some(Input::Command(command)),
            event = next_service_event(&mut self.service_events), if listening => {
                Some(Input::Event(event))
            }
            Some(completion) = self.completions_rx.recv(), if waiting => {
                Some(Input::Completion(completion))
            }
            else => None,
        }
    }

    async fn handle_event(&mut self, event: Option<DeviceEvent>) {
        match event {
            Some(event) => self.apply(event).await,
            None => {
                warn!("Device event stream closed; no further device changes will be seen");
                self.service_events = None;
            }
        }
    }

    /// Wait for the next service event or operation reply and process it.
    ///
    /// Returns `false` once there is nothing left to wait for: the event stream has
    /// ended (or was never opened) and no operation is in flight.
    pub async fn process_next(&mut self) -> bool {
        match self.next_input(None).await {
            Some(Input::Event(event)) => {
                self.handle_event(event).await;
                true
            }
            Some(Input::Completion(completion)) => {
                self.complete(completion);
                true
            }
            Some(Input::Command(_)) | None => false,
        }
    }

    /// Move the registry onto its own task and return a handle to it.
    ///
    /// The task stops once every handle is dropped and all issued operations have
    /// been reported.
    pub fn spawn(self) -> RegistryHandle {
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        tokio::spawn(self.run(receiver));
        RegistryHandle::new(sender)
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut accepting = true;

        loop {
            let input = self
                .next_input(if accepting { Some(&mut commands) } else { None })
                .await;

            match input {
                Some(Input::Command(Some(command))) => self.handle_command(command),
                Some(Input::Command(None)) => accepting = false,
                Some(Input::Event(event)) => self.handle_event(event).await,
                Some(Input::Completion(completion)) => self.complete(completion),
                None => break,
            }

            if !accepting && self.in_flight == 0 {
                break;
            }
        }

        debug!("Device registry task stopped");
    }

    fn handle_command(&mut self, command: Command) {
        // A dropped reply channel only means the caller stopped waiting.
        match command {
            Command::IsHealthy(reply) => {
                let _ = reply.send(self.is_healthy());
            }
            Command::ListDevices(reply) => {
                let _ = reply.send(self.list_devices());
            }
            Command::Lookup(id, reply) => {
                let _ = reply.send(self.lookup(&id));
            }
            Command::FindByDeviceFile(path, reply) => {
                let _ = reply.send(self.find_by_device_file(&path));
            }
            Command::Mount(id) => self.request_mount(id),
            Command::Unmount(id, force) => self.request_unmount(id, force),
        }
    }
}

async fn recv_command(commands: Option<&mut mpsc::Receiver<Command>>) -> Option<Command> {
    match commands {
        Some(commands) => commands.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_service_event(events: &mut Option<DeviceEventStream>) -> Option<DeviceEvent> {
    match events {
        Some(stream) => stream.recv().await,
        None => std::future::pending().await,
    }
}
