use hostmon_core::NetworkPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure parsed from `hostmon.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sampling cadence and history size.
    pub sampling: SamplingConfig,
    /// Filesystem usage settings.
    pub disk: DiskConfig,
    /// Network throughput aggregation.
    pub network: NetworkConfig,
}

/// Sampling cadence and history retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seconds between two collection cycles.
    pub interval_secs: u64,
    /// Number of records kept in the history buffer.
    pub capacity: usize,
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            capacity: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Filesystem to report usage for. Unset = platform default.
    pub root_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub policy: NetworkPolicy,
    /// Interface used by [`NetworkPolicy::Primary`], e.g. `"eth0"`.
    pub interface: Option<String>,
}
