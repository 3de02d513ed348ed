use hostmon_core::{CounterSnapshot, Counters, MonitorError, Result, Usage};
use std::ffi::OsStr;
use std::path::Path;
use sysinfo::{Disks, Networks, System};

/// Raw OS metrics the sampler polls once per cycle.
///
/// Every query is independent and best-effort: an `Err` only degrades the
/// affected fields of one record.
pub trait CounterSource: Send {
    /// Instantaneous per-logical-core utilisation, 0.0 – 100.0.
    fn cpu_usage(&mut self) -> Result<Vec<f32>>;

    /// Physical memory.
    fn memory(&mut self) -> Result<Usage>;

    fn swap(&mut self) -> Result<Usage>;

    /// Usage of the filesystem that contains `root`.
    fn filesystem(&mut self, root: &Path) -> Result<Usage>;

    /// Cumulative `{read, written}` bytes per disk device.
    fn disk_counters(&mut self) -> Result<CounterSnapshot>;

    /// Cumulative `{received, sent}` bytes per network interface.
    fn network_counters(&mut self) -> Result<CounterSnapshot>;
}

/// [`CounterSource`] backed by the `sysinfo` crate.
pub struct SysinfoSource {
    sys:      System,
    disks:    Disks,
    networks: Networks,
}

impl SysinfoSource {
    pub fn new() -> Self {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            tracing::warn!("sysinfo does not support this platform; records will be zero-valued");
        }

        let mut sys = System::new();
        // Prime CPU usage so the first real refresh has something to diff against.
        sys.refresh_cpu_usage();

        Self {
            sys,
            disks:    Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for SysinfoSource {
    fn cpu_usage(&mut self) -> Result<Vec<f32>> {
        self.sys.refresh_cpu_usage();
        let per_core: Vec<f32> = self.sys.cpus().iter().map(|c| c.cpu_usage()).collect();
        if per_core.is_empty() {
            return Err(MonitorError::Unsupported("per-core CPU usage".into()));
        }
        Ok(per_core)
    }

    fn memory(&mut self) -> Result<Usage> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(MonitorError::Unsupported("physical memory".into()));
        }
        Ok(Usage {
            total,
            used: self.sys.used_memory(),
            free: self.sys.free_memory(),
        })
    }

    fn swap(&mut self) -> Result<Usage> {
        self.sys.refresh_memory();
        // A zero total just means no swap is configured.
        Ok(Usage {
            total: self.sys.total_swap(),
            used:  self.sys.used_swap(),
            free:  self.sys.free_swap(),
        })
    }

    fn filesystem(&mut self, root: &Path) -> Result<Usage> {
        self.disks.refresh(true);
        filesystem_usage(
            root,
            self.disks.iter().map(|d| Mount {
                mount_point: d.mount_point(),
                total:       d.total_space(),
                available:   d.available_space(),
            }),
        )
    }

    fn disk_counters(&mut self) -> Result<CounterSnapshot> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(MonitorError::Unsupported("disk I/O counters".into()));
        }
        self.disks.refresh(true);

        Ok(disk_snapshot(self.disks.iter().map(|d| {
            let usage = d.usage();
            (
                d.name(),
                d.mount_point(),
                Counters::new(usage.total_read_bytes, usage.total_written_bytes),
            )
        })))
    }

    fn network_counters(&mut self) -> Result<CounterSnapshot> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(MonitorError::Unsupported("network I/O counters".into()));
        }
        // true = drop interfaces that disappeared since the last refresh
        self.networks.refresh(true);

        Ok(self
            .networks
            .iter()
            .map(|(name, data)| {
                (
                    name.as_str(),
                    Counters::new(data.total_received(), data.total_transmitted()),
                )
            })
            .collect())
    }
}

/// One mounted filesystem as reported by the OS.
#[derive(Debug, Clone, Copy)]
pub struct Mount<'a> {
    pub mount_point: &'a Path,
    pub total:       u64,
    pub available:   u64,
}

/// Usage of the deepest mount point containing `root`.
pub fn filesystem_usage<'a>(
    root: &Path,
    mounts: impl IntoIterator<Item = Mount<'a>>,
) -> Result<Usage> {
    let mount = mounts
        .into_iter()
        .filter(|m| root.starts_with(m.mount_point))
        .max_by_key(|m| m.mount_point.components().count())
        .ok_or_else(|| {
            MonitorError::Source(format!("no mounted filesystem contains '{}'", root.display()))
        })?;

    Ok(Usage {
        total: mount.total,
        used:  mount.total.saturating_sub(mount.available),
        free:  mount.available,
    })
}

/// Snapshot key for a disk: its device name, or the mount point when the
/// OS reports no name.
pub fn device_key(name: &OsStr, mount_point: &Path) -> String {
    let name = name.to_string_lossy();
    if name.is_empty() {
        mount_point.display().to_string()
    } else {
        name.into_owned()
    }
}

/// Cumulative disk counters keyed by [`device_key`]. A device mounted more
/// than once collapses to a single entry, so its traffic counts once.
pub fn disk_snapshot<'a>(
    disks: impl IntoIterator<Item = (&'a OsStr, &'a Path, Counters)>,
) -> CounterSnapshot {
    disks
        .into_iter()
        .map(|(name, mount_point, counters)| (device_key(name, mount_point), counters))
        .collect()
}
