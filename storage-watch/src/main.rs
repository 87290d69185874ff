// SPDX-License-Identifier: GPL-3.0-only

//! storage-watch: keeps a live view of the filesystem devices UDisks2 knows
//! about, reports hotplug changes and issues mount/unmount requests.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use storage_registry::DeviceRegistry;
use storage_udisks::UDisks2Service;

mod cli;
mod commands;
mod config;
mod logging;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let (config, config_error) = match Config::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let config = config.with_overrides(cli.session_bus, cli.verbose);

    logging::init(&config);
    if let Some(e) = config_error {
        tracing::warn!("{e:#}; using default configuration");
    }

    tracing::info!("Starting storage-watch v{}", env!("CARGO_PKG_VERSION"));

    let service = UDisks2Service::connect(config.bus.into())
        .await
        .context("connect to the message bus")?;
    let (registry, events) =
        DeviceRegistry::with_mount_options(Arc::new(service), config.mount_options()).await;

    if !registry.is_healthy() {
        tracing::error!("UDisks2 is unavailable; no devices can be tracked");
        return Ok(ExitCode::FAILURE);
    }

    commands::run(cli.command(), registry, events).await
}
