use crate::types::ImuSample;
use std::collections::VecDeque;

/// Samples retained by a server unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 100;

/// Fixed-capacity FIFO of the most recent samples.
///
/// Pushing at capacity evicts the oldest sample first, so the length never
/// exceeds the capacity.
#[derive(Debug, Clone)]
pub struct RetentionBuffer {
    samples: VecDeque<ImuSample>,
    capacity: usize,
}

impl RetentionBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: ImuSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Current contents, oldest first.
    pub fn snapshot(&self) -> Vec<ImuSample> {
        self.samples.iter().copied().collect()
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<&ImuSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RetentionBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
