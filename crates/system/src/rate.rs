//! Per-second throughput from two cumulative-counter snapshots.

use hostmon_core::{CounterSnapshot, NetworkPolicy};

/// Derived throughput in bytes/second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Throughput {
    /// Read (disk) or received (network).
    pub inbound: u64,
    /// Written (disk) or sent (network).
    pub outbound: u64,
}

/// Throughput between `prev` and `curr`, taken `interval_secs` apart.
///
/// - Only devices present in both snapshots contribute; hot-plugged or
///   vanished devices are ignored.
/// - A counter that went backwards (reset, wrap) contributes zero.
/// - No previous snapshot, or a zero interval, yields zero.
pub fn rate(prev: Option<&CounterSnapshot>, curr: &CounterSnapshot, interval_secs: u64) -> Throughput {
    let Some(prev) = prev else {
        return Throughput::default();
    };
    if interval_secs == 0 {
        return Throughput::default();
    }

    let mut inbound: u64 = 0;
    let mut outbound: u64 = 0;
    for (name, before) in prev.iter() {
        if let Some(after) = curr.get(name) {
            inbound = inbound.saturating_add(after.inbound.saturating_sub(before.inbound));
            outbound = outbound.saturating_add(after.outbound.saturating_sub(before.outbound));
        }
    }

    Throughput {
        inbound: inbound / interval_secs,
        outbound: outbound / interval_secs,
    }
}

/// Network throughput under `policy`.
///
/// `Sum` is [`rate`] over every interface. `Primary` rates a single
/// interface: `interface` when given, otherwise the first name (in name
/// order) present in both readings, so an interface that appears or
/// vanishes between the two never displaces one that was there all along.
pub fn network_rate(
    policy: NetworkPolicy,
    interface: Option<&str>,
    prev: Option<&CounterSnapshot>,
    curr: &CounterSnapshot,
    interval_secs: u64,
) -> Throughput {
    match policy {
        NetworkPolicy::Sum => rate(prev, curr, interval_secs),
        NetworkPolicy::Primary => {
            let Some(prev) = prev else {
                return Throughput::default();
            };
            let Some(name) = interface.or_else(|| prev.first_shared(curr)) else {
                return Throughput::default();
            };
            rate(Some(&prev.only(name)), &curr.only(name), interval_secs)
        }
    }
}
