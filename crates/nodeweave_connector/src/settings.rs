// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connector settings, stored as RON.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Tunables for how drops are resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSettings {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Dropping on a node's body connects to the first slot of a matching type
    #[serde(default = "default_true")]
    pub allow_drop_on_node_body: bool,
    /// Links disconnected by a drop on empty canvas leave their reroutes behind
    #[serde(default = "default_true")]
    pub keep_reroutes_on_disconnect: bool,
    /// A moved output link rejected by its drop target is reconnected to its
    /// original output without reroutes
    #[serde(default = "default_true")]
    pub reconnect_rejected_output_moves: bool,
}

fn default_version() -> u32 {
    SETTINGS_FORMAT_VERSION
}

fn default_true() -> bool {
    true
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            allow_drop_on_node_body: true,
            keep_reroutes_on_disconnect: true,
            reconnect_rejected_output_moves: true,
        }
    }
}

impl ConnectorSettings {
    /// Parse settings from RON text
    pub fn from_ron_str(text: &str) -> std::io::Result<Self> {
        let settings: ConnectorSettings = ron::from_str(text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Settings version {} is newer than supported version {}",
                    settings.version, SETTINGS_FORMAT_VERSION
                ),
            ));
        }

        Ok(settings)
    }

    /// Render settings as pretty RON
    pub fn to_ron_string(&self) -> std::io::Result<String> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        ron::ser::to_string_pretty(self, config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_ron_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded connector settings");
        Ok(settings)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_ron_string()?)
    }
}
