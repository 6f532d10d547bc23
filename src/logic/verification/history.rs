//! Bounded detection history (ring buffer, oldest evicted first).

use std::collections::VecDeque;

use super::types::DetectionResult;

#[derive(Debug, Clone)]
pub struct DetectionHistory {
    entries: VecDeque<DetectionResult>,
    capacity: usize,
}

impl DetectionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, result: DetectionResult) {
        self.entries.push_back(result);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Up to `n` most recent entries, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &DetectionResult> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip)
    }

    pub fn to_vec(&self) -> Vec<DetectionResult> {
        self.entries.iter().cloned().collect()
    }
}
