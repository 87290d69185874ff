// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use crate::config::{Config, LoggingLevel};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const DEFAULT_LOG_PREFIX: &str = "storage-watch.log";
const KEEP_DAYS: u64 = 7;
const ZBUS_DIRECTIVE: &str = "zbus=warn";

/// Install the global subscriber: stderr always, plus a daily log file unless
/// disabled. Stdout is left to the command output.
pub(crate) fn init(config: &Config) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = env_filter(rust_log.as_deref(), config.log_level);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime);

    if !config.log_to_disk {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return;
    }

    match file_writer() {
        Ok((writer, guard)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_timer(tracing_subscriber::fmt::time::SystemTime);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();

            // Keep the background logging worker alive for the duration of the process.
            let _ = LOG_GUARD.set(guard);
        }
        Err(e) => {
            eprintln!("storage-watch: failed to initialize file logging: {e:#}");
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .init();
        }
    }
}

/// A valid, non-empty `RUST_LOG` wins outright; otherwise the configured level
/// applies everywhere.
fn env_filter(rust_log: Option<&str>, level: LoggingLevel) -> EnvFilter {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("storage-watch: ignoring invalid RUST_LOG: {e}"),
        }
    }

    // zbus logs every message at debug; keep it quiet unless asked for.
    EnvFilter::builder()
        .with_default_directive(level.as_level_filter().into())
        .parse_lossy(ZBUS_DIRECTIVE)
}

fn file_writer() -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let dir = resolve_log_dir();
    let prefix = OsString::from(DEFAULT_LOG_PREFIX);

    if let Err(e) = fs::create_dir_all(&dir) {
        return Err(anyhow::anyhow!(
            "create log directory failed: {} ({})",
            dir.display(),
            e
        ));
    }

    cleanup_old_logs(&dir, &prefix, SystemTime::now());

    let appender = tracing_appender::rolling::daily(&dir, &prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    Ok((writer, guard))
}

fn resolve_log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("STORAGE_WATCH_LOG_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(xdg_state) = std::env::var_os("XDG_STATE_HOME") {
        return PathBuf::from(xdg_state).join("storage-watch").join("logs");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join("storage-watch")
            .join("logs");
    }

    PathBuf::from("/tmp").join("storage-watch").join("logs")
}

fn cleanup_old_logs(dir: &Path, prefix: &OsString, now: SystemTime) {
    let Some(cutoff) = now.checked_sub(Duration::from_secs(KEEP_DAYS * 24 * 60 * 60)) else {
        return;
    };

    let prefix = prefix.to_string_lossy();

    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let file_name = entry.file_name();
        // Only touch files created by our rolling appender.
        if !file_name.to_string_lossy().starts_with(prefix.as_ref()) {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        if modified >= cutoff {
            continue;
        }

        let _ = fs::remove_file(entry.path());
    }
}
