use crate::history::History;
use crate::rate::{network_rate, rate, Throughput};
use crate::root::RootPathPolicy;
use crate::source::CounterSource;
use chrono::Utc;
use hostmon_core::{CounterSnapshot, MonitorError, NetworkPolicy, Result, SampleRecord};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Periodically polls a [`CounterSource`], turns cumulative counters into
/// per-second rates and appends one [`SampleRecord`] per cycle to a shared
/// [`History`].
///
/// The previous cumulative snapshots (every interface; the network policy is
/// applied at rate time) are owned by the sampler alone, so they need no
/// locking.
pub struct Sampler<S> {
    source:    S,
    history:   Arc<History>,
    interval:  Duration,
    root:      PathBuf,
    policy:    NetworkPolicy,
    interface: Option<String>,
    prev_disk: Option<CounterSnapshot>,
    prev_net:  Option<CounterSnapshot>,
}

impl<S: CounterSource> Sampler<S> {
    /// `root` is resolved here, once; the network policy starts at its default.
    pub fn new(
        source: S,
        history: Arc<History>,
        interval: Duration,
        root: &dyn RootPathPolicy,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(MonitorError::Config("sampling interval must be non-zero".into()));
        }
        let root = root.root_path();
        info!("reporting filesystem usage for '{}'", root.display());
        Ok(Self {
            source,
            history,
            interval,
            root,
            policy: NetworkPolicy::default(),
            interface: None,
            prev_disk: None,
            prev_net: None,
        })
    }

    #[must_use]
    pub fn with_network(mut self, policy: NetworkPolicy, interface: Option<String>) -> Self {
        self.policy = policy;
        self.interface = interface;
        self
    }

    /// Take the initial cumulative disk / network reading. Produces no record.
    pub fn baseline(&mut self) {
        self.prev_disk = self.read_disk();
        self.prev_net = self.read_network();
        info!(
            disks = self.prev_disk.as_ref().map_or(0, CounterSnapshot::len),
            interfaces = self.prev_net.as_ref().map_or(0, CounterSnapshot::len),
            "baseline counters captured"
        );
    }

    /// Run one collection cycle and return the record without storing it.
    ///
    /// Failed queries are logged and recorded as zero; the cycle always
    /// produces a record.
    pub fn sample(&mut self) -> SampleRecord {
        let secs = self.interval.as_secs();

        let cpu_usage = degrade("cpu", self.source.cpu_usage()).unwrap_or_default();
        let memory = degrade("memory", self.source.memory()).unwrap_or_default();
        let swap = degrade("swap", self.source.swap()).unwrap_or_default();
        let fs = degrade("filesystem", self.source.filesystem(&self.root)).unwrap_or_default();

        // A failed read drops the previous snapshot so the next good read
        // starts a fresh baseline instead of spanning several intervals.
        let disk_now = self.read_disk();
        let disk = throughput(self.prev_disk.as_ref(), disk_now.as_ref(), secs);
        self.prev_disk = disk_now;

        let net_now = self.read_network();
        let net = net_now
            .as_ref()
            .map(|curr| {
                network_rate(self.policy, self.interface.as_deref(), self.prev_net.as_ref(), curr, secs)
            })
            .unwrap_or_default();
        self.prev_net = net_now;

        SampleRecord {
            timestamp: Utc::now(),
            cpu_usage,
            memory_total: memory.total,
            memory_used: memory.used,
            memory_free: memory.free,
            swap_total: swap.total,
            swap_used: swap.used,
            swap_free: swap.free,
            disk_total: fs.total,
            disk_used: fs.used,
            disk_free: fs.free,
            disk_read_bps: disk.inbound,
            disk_write_bps: disk.outbound,
            net_rx_bps: net.inbound,
            net_tx_bps: net.outbound,
        }
    }

    /// [`sample`](Self::sample) and append the result to the history.
    pub fn run_cycle(&mut self) {
        let record = self.sample();
        debug!(
            cpu = record.cpu_average(),
            mem_used = record.memory_used,
            disk_read = record.disk_read_bps,
            disk_write = record.disk_write_bps,
            net_rx = record.net_rx_bps,
            net_tx = record.net_tx_bps,
            "sample collected"
        );
        self.history.append(record);
    }

    fn read_disk(&mut self) -> Option<CounterSnapshot> {
        degrade("disk counters", self.source.disk_counters())
    }

    fn read_network(&mut self) -> Option<CounterSnapshot> {
        degrade("network counters", self.source.network_counters())
    }
}

impl<S: CounterSource + 'static> Sampler<S> {
    /// Spawn the sampling loop as a background Tokio task.
    ///
    /// Takes the baseline, then sleeps one interval before every cycle until
    /// the returned handle is stopped or dropped.
    pub fn spawn(mut self) -> SamplerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            self.baseline();

            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // completes immediately

            info!("sampler running every {:?}", self.interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => self.run_cycle(),
                }
            }
            info!("sampler stopped");
        });

        SamplerHandle {
            cancel,
            task: Some(task),
        }
    }
}

/// Owner-side handle of a running sampler. Dropping it stops the loop.
pub struct SamplerHandle {
    cancel: CancellationToken,
    task:   Option<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Signal the loop to stop and wait for it to exit.
    pub async fn stop(mut self) -> Result<()> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| MonitorError::Sampler(format!("sampler task failed: {e}")))?;
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn degrade<T>(metric: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(metric, "counter query failed, recording zero: {e}");
            None
        }
    }
}

fn throughput(prev: Option<&CounterSnapshot>, curr: Option<&CounterSnapshot>, secs: u64) -> Throughput {
    curr.map(|curr| rate(prev, curr, secs)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::FixedRoot;
    use hostmon_core::{Counters, Usage};
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counter source that replays queued cumulative readings.
    #[derive(Default)]
    struct Scripted {
        disk:        VecDeque<Result<CounterSnapshot>>,
        net:         VecDeque<Result<CounterSnapshot>>,
        fail_memory: bool,
    }

    impl Scripted {
        fn disk(mut self, reading: Result<CounterSnapshot>) -> Self {
            self.disk.push_back(reading);
            self
        }

        fn net(mut self, reading: Result<CounterSnapshot>) -> Self {
            self.net.push_back(reading);
            self
        }
    }

    impl CounterSource for Scripted {
        fn cpu_usage(&mut self) -> Result<Vec<f32>> {
            Ok(vec![25.0, 75.0])
        }

        fn memory(&mut self) -> Result<Usage> {
            if self.fail_memory {
                return Err(MonitorError::Source("permission denied".into()));
            }
            Ok(Usage { total: 16, used: 4, free: 12 })
        }

        fn swap(&mut self) -> Result<Usage> {
            Ok(Usage { total: 8, used: 1, free: 7 })
        }

        fn filesystem(&mut self, root: &Path) -> Result<Usage> {
            if root == Path::new("/missing") {
                return Err(MonitorError::Source("no such mount".into()));
            }
            Ok(Usage { total: 100, used: 60, free: 40 })
        }

        fn disk_counters(&mut self) -> Result<CounterSnapshot> {
            self.disk.pop_front().unwrap_or_else(|| Ok(CounterSnapshot::new()))
        }

        fn network_counters(&mut self) -> Result<CounterSnapshot> {
            self.net.pop_front().unwrap_or_else(|| Ok(CounterSnapshot::new()))
        }
    }

    /// Every disk read advances `sda` by 5 000 bytes read / 500 written.
    #[derive(Default)]
    struct Ticking {
        reads: u64,
    }

    impl CounterSource for Ticking {
        fn cpu_usage(&mut self) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }
        fn memory(&mut self) -> Result<Usage> {
            Ok(Usage::default())
        }
        fn swap(&mut self) -> Result<Usage> {
            Ok(Usage::default())
        }
        fn filesystem(&mut self, _root: &Path) -> Result<Usage> {
            Ok(Usage::default())
        }
        fn disk_counters(&mut self) -> Result<CounterSnapshot> {
            self.reads += 1;
            let mut snap = CounterSnapshot::new();
            snap.insert("sda", Counters::new(self.reads * 5_000, self.reads * 500));
            Ok(snap)
        }
        fn network_counters(&mut self) -> Result<CounterSnapshot> {
            Err(MonitorError::Unsupported("network I/O counters".into()))
        }
    }

    fn one(name: &str, inbound: u64, outbound: u64) -> Result<CounterSnapshot> {
        let mut snap = CounterSnapshot::new();
        snap.insert(name, Counters::new(inbound, outbound));
        Ok(snap)
    }

    fn build_at<S: CounterSource>(source: S, capacity: usize, root: &str) -> (Sampler<S>, Arc<History>) {
        let history = Arc::new(History::new(capacity).unwrap());
        let root = FixedRoot(PathBuf::from(root));
        let sampler =
            Sampler::new(source, Arc::clone(&history), Duration::from_secs(5), &root).unwrap();
        (sampler, history)
    }

    fn build<S: CounterSource>(source: S, capacity: usize) -> (Sampler<S>, Arc<History>) {
        build_at(source, capacity, "/")
    }

    /// Root policy that counts how often it is asked.
    struct CountingRoot(AtomicUsize);

    impl RootPathPolicy for CountingRoot {
        fn root_path(&self) -> PathBuf {
            self.0.fetch_add(1, Ordering::SeqCst);
            PathBuf::from("/")
        }
    }

    #[test]
    fn zero_interval_rejected() {
        let history = Arc::new(History::new(1).unwrap());
        let root = FixedRoot(PathBuf::from("/"));
        let result = Sampler::new(Scripted::default(), history, Duration::ZERO, &root);
        assert!(matches!(result, Err(MonitorError::Config(_))));
    }

    #[test]
    fn root_path_resolved_once_at_construction() {
        let history = Arc::new(History::new(4).unwrap());
        let root = CountingRoot(AtomicUsize::new(0));
        let mut sampler =
            Sampler::new(Ticking::default(), history, Duration::from_secs(5), &root).unwrap();

        sampler.baseline();
        for _ in 0..3 {
            sampler.run_cycle();
        }
        assert_eq!(root.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn first_cycle_after_baseline_derives_rates() {
        let source = Scripted::default()
            .disk(one("diskA", 1_000, 0))
            .disk(one("diskA", 5_000, 2_500))
            .net(one("eth0", 0, 0))
            .net(one("eth0", 500, 250));
        let (mut sampler, _) = build(source, 10);

        sampler.baseline();
        let record = sampler.sample();

        assert_eq!(record.disk_read_bps, 800);
        assert_eq!(record.disk_write_bps, 500);
        assert_eq!(record.net_rx_bps, 100);
        assert_eq!(record.net_tx_bps, 50);
        assert_eq!(record.cpu_usage, vec![25.0, 75.0]);
        assert_eq!((record.memory_total, record.memory_used, record.memory_free), (16, 4, 12));
        assert_eq!((record.swap_total, record.swap_used, record.swap_free), (8, 1, 7));
        assert_eq!((record.disk_total, record.disk_used, record.disk_free), (100, 60, 40));
    }

    #[test]
    fn without_baseline_rates_are_zero() {
        let source = Scripted::default()
            .disk(one("diskA", 5_000, 5_000))
            .net(one("eth0", 5_000, 5_000));
        let (mut sampler, _) = build(source, 10);

        let record = sampler.sample();
        assert_eq!(record.disk_read_bps, 0);
        assert_eq!(record.disk_write_bps, 0);
        assert_eq!(record.net_rx_bps, 0);
        assert_eq!(record.net_tx_bps, 0);
    }

    #[test]
    fn failed_query_still_appends_zeroed_record() {
        let source = Scripted {
            fail_memory: true,
            ..Scripted::default()
        };
        let (mut sampler, history) = build_at(source, 10, "/missing");

        sampler.run_cycle();

        let records = history.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].memory_total, 0);
        assert_eq!(records[0].disk_total, 0);
        assert_eq!(records[0].cpu_usage, vec![25.0, 75.0]);
        assert_eq!(records[0].swap_total, 8);
    }

    #[test]
    fn failed_counter_read_restarts_baseline() {
        let source = Scripted::default()
            .disk(one("sda", 1_000, 0))
            .disk(Err(MonitorError::Source("device busy".into())))
            .disk(one("sda", 9_000, 0))
            .disk(one("sda", 14_000, 0));
        let (mut sampler, _) = build(source, 10);

        sampler.baseline();
        assert_eq!(sampler.sample().disk_read_bps, 0);
        assert_eq!(sampler.sample().disk_read_bps, 0);
        assert_eq!(sampler.sample().disk_read_bps, 1_000);
    }

    #[test]
    fn primary_policy_uses_named_interface() {
        let mut before = CounterSnapshot::new();
        before.insert("eth0", Counters::new(0, 0));
        before.insert("wlan0", Counters::new(0, 0));
        let mut after = CounterSnapshot::new();
        after.insert("eth0", Counters::new(1_000, 0));
        after.insert("wlan0", Counters::new(50, 0));

        let source = Scripted::default().net(Ok(before)).net(Ok(after));
        let (sampler, _) = build(source, 10);
        let mut sampler = sampler.with_network(NetworkPolicy::Primary, Some("wlan0".into()));

        sampler.baseline();
        assert_eq!(sampler.sample().net_rx_bps, 10);
    }

    #[test]
    fn sum_policy_adds_all_interfaces() {
        let mut before = CounterSnapshot::new();
        before.insert("eth0", Counters::new(0, 0));
        before.insert("wlan0", Counters::new(0, 0));
        let mut after = CounterSnapshot::new();
        after.insert("eth0", Counters::new(1_000, 0));
        after.insert("wlan0", Counters::new(50, 0));

        let source = Scripted::default().net(Ok(before)).net(Ok(after));
        let (sampler, _) = build(source, 10);
        let mut sampler = sampler.with_network(NetworkPolicy::Sum, None);

        sampler.baseline();
        assert_eq!(sampler.sample().net_rx_bps, 210);
    }

    #[test]
    fn default_policy_keeps_traffic_when_interface_appears() {
        let source = Scripted::default()
            .net(one("enp3s0", 0, 0))
            .net(Ok([
                ("br-new", Counters::new(0, 0)),
                ("enp3s0", Counters::new(50_000, 0)),
            ]
            .into_iter()
            .collect()));
        let (mut sampler, _) = build(source, 10);

        sampler.baseline();
        assert_eq!(sampler.sample().net_rx_bps, 10_000);
    }

    #[test]
    fn unnamed_primary_keeps_traffic_when_interface_appears() {
        let source = Scripted::default()
            .net(one("enp3s0", 0, 0))
            .net(Ok([
                ("br-new", Counters::new(0, 0)),
                ("enp3s0", Counters::new(50_000, 0)),
            ]
            .into_iter()
            .collect()));
        let (sampler, _) = build(source, 10);
        let mut sampler = sampler.with_network(NetworkPolicy::Primary, None);

        sampler.baseline();
        assert_eq!(sampler.sample().net_rx_bps, 10_000);
    }

    #[test]
    fn history_holds_only_latest_cycles() {
        let (mut sampler, history) = build(Ticking::default(), 3);
        sampler.baseline();
        for _ in 0..5 {
            sampler.run_cycle();
        }
        let records = history.snapshot();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.disk_read_bps == 1_000));
        assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_samples_each_interval_until_stopped() {
        let (sampler, history) = build(Ticking::default(), 10);
        let handle = sampler.spawn();

        time::sleep(Duration::from_secs(17)).await;
        assert!(!handle.is_finished());
        assert_eq!(history.len(), 3);
        let latest = history.latest().unwrap();
        assert_eq!(latest.disk_read_bps, 1_000);
        assert_eq!(latest.disk_write_bps, 100);
        assert_eq!(latest.net_rx_bps, 0);

        handle.stop().await.unwrap();
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(history.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_loop() {
        let (sampler, history) = build(Ticking::default(), 10);
        let handle = sampler.spawn();

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(history.len(), 1);

        drop(handle);
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(history.len(), 1);
    }
}
