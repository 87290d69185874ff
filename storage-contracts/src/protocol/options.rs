// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Options passed with a filesystem mount request. The default lets the
/// service pick the filesystem type and mount options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountOptions {
    pub filesystem_type: Option<String>,
    pub options: Vec<String>,
}

impl MountOptions {
    /// Comma separated option string, `None` when no options are set.
    pub fn joined(&self) -> Option<String> {
        if self.options.is_empty() {
            None
        } else {
            Some(self.options.join(","))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmountOptions {
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mount_options_are_empty() {
        assert_eq!(MountOptions::default().joined(), None);
    }

    #[test]
    fn mount_options_join_with_commas() {
        let opts = MountOptions {
            filesystem_type: None,
            options: vec!["ro".to_string(), "noexec".to_string()],
        };
        assert_eq!(opts.joined().as_deref(), Some("ro,noexec"));
    }
}
