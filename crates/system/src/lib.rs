//! Sampling core: polls a [`CounterSource`] on a fixed interval, derives
//! per-second disk / network rates and keeps a bounded [`History`] of
//! [`SampleRecord`](hostmon_core::SampleRecord)s for readers.

pub mod format;
pub mod history;
pub mod rate;
pub mod root;
pub mod sampler;
pub mod source;

pub use history::History;
pub use rate::{network_rate, rate, Throughput};
pub use root::{root_policy, RootPathPolicy};
pub use sampler::{Sampler, SamplerHandle};
pub use source::{CounterSource, SysinfoSource};
