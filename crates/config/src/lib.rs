pub mod schema;

pub use schema::{DiskConfig, MonitorConfig, NetworkConfig, SamplingConfig};

use hostmon_core::{MonitorError, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `MonitorConfig::default()`
/// if the file doesn't exist so the monitor always has sensible defaults.
///
/// The result is validated; an invalid file is a fatal startup error.
pub fn load(path: impl AsRef<Path>) -> Result<MonitorConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(MonitorConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| MonitorError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config: MonitorConfig =
        toml::from_str(&raw).map_err(|e| MonitorError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;

    tracing::info!("Loaded config from '{}'", path.display());
    Ok(config)
}

impl MonitorConfig {
    /// Reject values the sampler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.capacity == 0 {
            return Err(MonitorError::Config(
                "sampling.capacity must be at least 1".into(),
            ));
        }
        if self.sampling.interval_secs == 0 {
            return Err(MonitorError::Config(
                "sampling.interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("hostmon").join("hostmon.toml")
}
