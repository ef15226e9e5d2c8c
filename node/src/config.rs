//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use helix_types::ScheduleParams;

use crate::NodeError;

/// Configuration for a Helix node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for chain state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Producer slot counts per scheduling round. Mainnet values by
    /// default; devnets shrink these to run with a handful of producers.
    #[serde(default)]
    pub schedule: ScheduleParams,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Worker threads for the miner's nonce search.
    #[serde(default = "default_work_threads")]
    pub work_threads: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./helix_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_work_threads() -> usize {
    1
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        if !config.schedule.is_valid() {
            return Err(NodeError::Config(
                "schedule slot counts must be symmetric and non-zero".to_string(),
            ));
        }
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            schedule: ScheduleParams::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            work_threads: default_work_threads(),
        }
    }
}
