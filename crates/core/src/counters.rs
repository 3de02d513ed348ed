use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cumulative byte counters for one disk device or network interface.
///
/// For disks `inbound` is bytes read and `outbound` bytes written; for
/// network interfaces they are bytes received and bytes sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub inbound: u64,
    pub outbound: u64,
}

impl Counters {
    pub fn new(inbound: u64, outbound: u64) -> Self {
        Self { inbound, outbound }
    }
}

/// Cumulative counters keyed by device / interface name, in name order.
///
/// Only lives between two consecutive sampling cycles; never stored in history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    devices: BTreeMap<String, Counters>,
}

impl CounterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the counters for `name`.
    pub fn insert(&mut self, name: impl Into<String>, counters: Counters) {
        self.devices.insert(name.into(), counters);
    }

    pub fn get(&self, name: &str) -> Option<&Counters> {
        self.devices.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Counters)> {
        self.devices.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// A snapshot holding only the entry named `name`, if present.
    #[must_use]
    pub fn only(&self, name: &str) -> Self {
        let mut narrowed = Self::new();
        if let Some(counters) = self.devices.get(name) {
            narrowed.insert(name, *counters);
        }
        narrowed
    }

    /// First name, in name order, present in both `self` and `other`.
    pub fn first_shared<'a>(&'a self, other: &Self) -> Option<&'a str> {
        self.devices
            .keys()
            .find(|name| other.devices.contains_key(*name))
            .map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<(S, Counters)> for CounterSnapshot {
    fn from_iter<I: IntoIterator<Item = (S, Counters)>>(iter: I) -> Self {
        Self {
            devices: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// `{total, used, free}` in bytes — RAM, swap, or a filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// How network throughput is aggregated across interfaces.
///
/// Disk throughput always sums every device. Network defaults to summing
/// every interface as well, which matches an aggregate OS counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPolicy {
    /// One interface: the configured one, else the first interface (in
    /// name order) present in both readings.
    Primary,
    /// Every interface reported by the counter source.
    #[default]
    Sum,
}
