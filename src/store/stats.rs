//! Store Statistics Module
//!
//! Tracks read outcomes and lazy evictions.

use serde::Serialize;

// == Store Stats ==
/// Tracks store access metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of reads that returned a value
    pub hits: u64,
    /// Number of reads that found nothing (missing or expired)
    pub misses: u64,
    /// Number of entries evicted because their expiry passed
    pub expired: u64,
    /// Number of entries removed after their last permitted read
    pub exhausted: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
}

impl StoreStats {
    /// Creates zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Recording ==
    /// Counts a read that returned a value.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Counts a read that returned nothing.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts `count` entries evicted for passing their expiry.
    pub fn record_expired(&mut self, count: usize) {
        self.expired += count as u64;
    }

    /// Counts an entry removed after its last permitted read.
    pub fn record_exhausted(&mut self) {
        self.exhausted += 1;
    }

    /// Records the current entry count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StoreStats::new();
        assert_eq!(stats, StoreStats::default());
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = StoreStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_eviction_counters() {
        let mut stats = StoreStats::new();
        stats.record_expired(3);
        stats.record_exhausted();
        stats.set_total_entries(4);
        assert_eq!(stats.expired, 3);
        assert_eq!(stats.exhausted, 1);
        assert_eq!(stats.total_entries, 4);
    }

    #[test]
    fn test_stats_serialize() {
        let json = serde_json::to_value(StoreStats::new()).unwrap();
        assert_eq!(json["hits"], 0);
        assert_eq!(json["total_entries"], 0);
    }
}
