// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "storage-watch", version)]
#[command(about = "Watch and mount removable storage devices through UDisks2")]
pub struct Cli {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/storage-watch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Talk to UDisks2 on the session bus instead of the system bus
    #[arg(long, global = true)]
    pub session_bus: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Watch { json: false })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print device notifications until interrupted
    Watch {
        #[arg(long)]
        json: bool,
    },
    /// Print the devices currently known
    List {
        #[arg(long)]
        json: bool,
    },
    /// Mount a device given by object path or device file
    Mount { device: String },
    /// Unmount a device given by object path or device file
    Unmount {
        device: String,
        #[arg(long)]
        force: bool,
    },
}
