//! hostmon — samples host CPU, memory, swap, disk and network usage and keeps
//! a short rolling history.
//!
//! Run with:  `RUST_LOG=info hostmon`   (config: `$HOSTMON_CONFIG` or
//! `~/.config/hostmon/hostmon.toml`)
//!
//! Ctrl-C stops sampling and prints the history as a JSON array on stdout.

use anyhow::Result;
use hostmon_config::{default_path, load as load_config};
use hostmon_core::SampleRecord;
use hostmon_system::format::{format_bytes, format_rate};
use hostmon_system::{root_policy, History, Sampler, SysinfoSource};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{self, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging — RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("hostmon v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var_os("HOSTMON_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(default_path);
    let config = load_config(&config_path)?;

    let history = Arc::new(History::new(config.sampling.capacity)?);
    let root = root_policy(config.disk.root_path.as_deref());

    let sampler = Sampler::new(
        SysinfoSource::new(),
        Arc::clone(&history),
        config.sampling.interval(),
        root.as_ref(),
    )?
    .with_network(config.network.policy, config.network.interface.clone());
    let handle = sampler.spawn();

    let mut report = time::interval(config.sampling.interval());
    report.set_missed_tick_behavior(MissedTickBehavior::Delay);
    report.tick().await;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("cannot listen for Ctrl-C: {e}");
                }
                break;
            }
            _ = report.tick() => {
                if let Some(latest) = history.latest() {
                    tracing::info!("{}", summary(&latest));
                }
            }
        }
    }

    tracing::info!("shutting down");
    handle.stop().await?;

    println!("{}", serde_json::to_string_pretty(&history.snapshot())?);
    Ok(())
}

/// One-line human summary of a record.
fn summary(record: &SampleRecord) -> String {
    format!(
        "cpu {:.1}% ({} cores) | mem {}/{} | swap {}/{} | disk {}/{} r {} w {} | net ↓{} ↑{}",
        record.cpu_average(),
        record.cpu_usage.len(),
        format_bytes(record.memory_used),
        format_bytes(record.memory_total),
        format_bytes(record.swap_used),
        format_bytes(record.swap_total),
        format_bytes(record.disk_used),
        format_bytes(record.disk_total),
        format_rate(record.disk_read_bps),
        format_rate(record.disk_write_bps),
        format_rate(record.net_rx_bps),
        format_rate(record.net_tx_bps),
    )
}
