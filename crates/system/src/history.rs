use hostmon_core::{MonitorError, Result, SampleRecord};
use parking_lot::RwLock;
use std::collections::VecDeque;

/// Rolling history of the most recent sample records, oldest first.
///
/// One writer (the sampler) appends; any number of readers take snapshots
/// concurrently. Readers never see a half-applied append.
#[derive(Debug)]
pub struct History {
    samples:  RwLock<VecDeque<SampleRecord>>,
    capacity: usize,
}

impl History {
    /// A zero capacity is a configuration error.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MonitorError::Config(
                "history capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            samples: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    /// Push a new record, evicting the oldest if at capacity.
    pub fn append(&self, record: SampleRecord) {
        let mut samples = self.samples.write();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(record);
    }

    /// Independent copy of the current contents, oldest → newest.
    pub fn snapshot(&self) -> Vec<SampleRecord> {
        self.samples.read().iter().cloned().collect()
    }

    /// The newest record, if any.
    pub fn latest(&self) -> Option<SampleRecord> {
        self.samples.read().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
