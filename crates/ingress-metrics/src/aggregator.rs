//! Per-pod, per-cycle request counter keyed by path.

use std::collections::HashMap;

/// Counts requests by path for one pod during one collection cycle.
///
/// Created fresh for every (pod, cycle) and dropped once its snapshot has
/// been emitted.
#[derive(Debug, Default)]
pub struct PathAggregator {
    counts: HashMap<String, u64>,
}

impl PathAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request for `path`.
    pub fn record(&mut self, path: &str) {
        self.record_n(path, 1);
    }

    pub fn record_n(&mut self, path: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        match self.counts.get_mut(path) {
            Some(count) => *count += amount,
            None => {
                self.counts.insert(path.to_string(), amount);
            }
        }
    }

    /// Everything recorded so far.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counts.clone()
    }

    /// Consume the aggregator, yielding its table without copying.
    pub fn into_snapshot(self) -> HashMap<String, u64> {
        self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
