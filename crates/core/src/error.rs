use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    Config(String),

    /// A counter query failed for this cycle (permission denied, device gone).
    #[error("counter source error: {0}")]
    Source(String),

    /// The platform does not expose this metric at all.
    #[error("unsupported metric: {0}")]
    Unsupported(String),

    #[error("sampler error: {0}")]
    Sampler(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
