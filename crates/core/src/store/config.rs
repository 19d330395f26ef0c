//! Configuration for the artifact store.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Artifact retention and capacity settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// How long an artifact stays downloadable.
    #[serde(default = "default_retention")]
    pub retention_secs: u64,

    /// How often the background sweeper purges expired artifacts.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Optional cap on total stored bytes. Oldest artifacts go first.
    #[serde(default)]
    pub max_total_bytes: Option<u64>,
}

fn default_retention() -> u64 {
    3600
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention(),
            sweep_interval_secs: default_sweep_interval(),
            max_total_bytes: None,
        }
    }
}

impl StoreConfig {
    pub fn with_retention(mut self, retention_secs: u64) -> Self {
        self.retention_secs = retention_secs;
        self
    }

    pub fn with_max_total_bytes(mut self, max_total_bytes: u64) -> Self {
        self.max_total_bytes = Some(max_total_bytes);
        self
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
