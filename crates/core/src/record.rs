use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point-in-time observation of host resource usage.
///
/// Built once per sampling cycle and never mutated after it enters the
/// history. Serialized field names are camelCase (`cpuUsage`, `diskReadBps`, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    /// Capture instant.
    pub timestamp: DateTime<Utc>,
    /// Per-logical-core CPU usage (0.0 – 100.0), in core order.
    pub cpu_usage: Vec<f32>,

    /// Physical memory in bytes.
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_free: u64,

    /// Swap in bytes.
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,

    /// Monitored root filesystem, in bytes.
    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_free: u64,

    /// Disk throughput summed over all devices, bytes/second.
    pub disk_read_bps: u64,
    pub disk_write_bps: u64,

    /// Network throughput, bytes/second.
    pub net_rx_bps: u64,
    pub net_tx_bps: u64,
}

impl SampleRecord {
    /// An all-zero record stamped with `timestamp`.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu_usage: Vec::new(),
            memory_total: 0,
            memory_used: 0,
            memory_free: 0,
            swap_total: 0,
            swap_used: 0,
            swap_free: 0,
            disk_total: 0,
            disk_used: 0,
            disk_free: 0,
            disk_read_bps: 0,
            disk_write_bps: 0,
            net_rx_bps: 0,
            net_tx_bps: 0,
        }
    }

    /// Average CPU usage across all cores.
    #[must_use]
    pub fn cpu_average(&self) -> f32 {
        if self.cpu_usage.is_empty() {
            return 0.0;
        }
        self.cpu_usage.iter().sum::<f32>() / self.cpu_usage.len() as f32
    }

    /// Memory usage as a fraction in `[0, 1]`.
    #[must_use]
    pub fn memory_fraction(&self) -> f32 {
        fraction(self.memory_used, self.memory_total)
    }

    /// Swap usage as a fraction in `[0, 1]`.
    #[must_use]
    pub fn swap_fraction(&self) -> f32 {
        fraction(self.swap_used, self.swap_total)
    }

    /// Root filesystem usage as a fraction in `[0, 1]`.
    #[must_use]
    pub fn disk_fraction(&self) -> f32 {
        fraction(self.disk_used, self.disk_total)
    }
}

fn fraction(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    (used as f64 / total as f64).min(1.0) as f32
}
