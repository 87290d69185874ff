// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use storage_contracts::MountOptions;
use storage_udisks::Bus;
use tracing::level_filters::LevelFilter;

const APP_DIR: &str = "storage-watch";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LoggingLevel {
    pub fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    /// Level after `steps` extra `-v` flags. Never lowers the level.
    pub fn raised(self, steps: u8) -> Self {
        match steps {
            0 => self,
            1 => self.max(Self::Debug),
            _ => Self::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    System,
    Session,
}

impl From<BusKind> for Bus {
    fn from(kind: BusKind) -> Self {
        match kind {
            BusKind::System => Bus::System,
            BusKind::Session => Bus::Session,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub log_level: LoggingLevel,
    pub log_to_disk: bool,
    pub bus: BusKind,
    /// Passed as the comma-joined "options" of every mount call.
    pub mount_options: Vec<String>,
    pub mount_filesystem_type: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LoggingLevel::Info,
            log_to_disk: true,
            bus: BusKind::System,
            mount_options: Vec::new(),
            mount_filesystem_type: None,
        }
    }
}

impl Config {
    /// Load from `path`, or the per-user config file when none is given.
    ///
    /// A missing file yields the defaults. An unreadable or malformed file is an
    /// error; callers fall back to the defaults after reporting it.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
            return Ok(Self::default());
        };

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("read config {}", path.display()));
            }
        };

        Self::parse(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply command-line flags on top of the file settings.
    pub fn with_overrides(mut self, session_bus: bool, verbosity: u8) -> Self {
        if session_bus {
            self.bus = BusKind::Session;
        }
        self.log_level = self.log_level.raised(verbosity);
        self
    }

    pub fn mount_options(&self) -> MountOptions {
        MountOptions {
            filesystem_type: self.mount_filesystem_type.clone(),
            options: self.mount_options.clone(),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join(APP_DIR).join(CONFIG_FILE));
    }

    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILE)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(Config::parse("").expect("parse empty"), Config::default());
    }

    #[test]
    fn full_file_is_parsed() {
        let config = Config::parse(
            r#"
            log_level = "debug"
            log_to_disk = false
            bus = "session"
            mount_options = ["ro", "noexec"]
            mount_filesystem_type = "vfat"
            "#,
        )
        .expect("parse config");

        assert_eq!(config.log_level, LoggingLevel::Debug);
        assert!(!config.log_to_disk);
        assert_eq!(config.bus, BusKind::Session);
        assert_eq!(
            config.mount_options(),
            MountOptions {
                filesystem_type: Some("vfat".to_string()),
                options: vec!["ro".to_string(), "noexec".to_string()],
            }
        );
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(Config::parse("log_level = \"chatty\"").is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Config::parse("log_levle = \"info\"").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!(
            "storage-watch-missing-{}/config.toml",
            std::process::id()
        ));
        assert_eq!(
            Config::load(Some(&path)).expect("missing file is fine"),
            Config::default()
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = std::env::temp_dir().join(format!("storage-watch-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, "log_level = [").expect("write config");

        let result = Config::load(Some(&path));
        let _ = fs::remove_dir_all(&dir);

        let err = result.expect_err("malformed config");
        assert!(format!("{err:#}").contains("parse config"));
    }

    #[test]
    fn flags_override_file_settings() {
        let config = Config::default().with_overrides(true, 1);
        assert_eq!(config.bus, BusKind::Session);
        assert_eq!(config.log_level, LoggingLevel::Debug);

        let config = Config::default().with_overrides(false, 0);
        assert_eq!(config.bus, BusKind::System);
        assert_eq!(config.log_level, LoggingLevel::Info);
    }

    #[test]
    fn verbosity_never_lowers_the_level() {
        assert_eq!(LoggingLevel::Trace.raised(1), LoggingLevel::Trace);
        assert_eq!(LoggingLevel::Error.raised(1), LoggingLevel::Debug);
        assert_eq!(LoggingLevel::Warn.raised(3), LoggingLevel::Trace);
    }
}
