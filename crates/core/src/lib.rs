pub mod counters;
pub mod error;
pub mod record;

pub use counters::{CounterSnapshot, Counters, NetworkPolicy, Usage};
pub use error::{MonitorError, Result};
pub use record::SampleRecord;
