//! Fragment cache counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Counters updated by the fragment cache.
///
/// Shared by reference between the cache and whoever reports on it.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    extractions: AtomicU64,
    failures: AtomicU64,
    extraction_time_us: AtomicU64,
}

impl CacheMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stored record was returned.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A caller started a new computation.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A caller joined a computation already in flight.
    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// An extraction finished successfully.
    pub fn record_extraction(&self, elapsed: Duration) {
        self.extractions.fetch_add(1, Ordering::Relaxed);
        self.extraction_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    /// An extraction failed.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values.
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            extractions: self.extractions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            extraction_time_us: self.extraction_time_us.load(Ordering::Relaxed),
        }
    }

    /// Reset every counter to zero.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.coalesced,
            &self.extractions,
            &self.failures,
            &self.extraction_time_us,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Point-in-time copy of [`CacheMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetricsSnapshot {
    /// Renders answered from the cache.
    pub hits: u64,
    /// Renders that started a computation.
    pub misses: u64,
    /// Renders that waited on another caller's computation.
    pub coalesced: u64,
    /// Successful extractions.
    pub extractions: u64,
    /// Failed extractions.
    pub failures: u64,
    /// Total time spent in successful extractions (microseconds).
    pub extraction_time_us: u64,
}

impl CacheMetricsSnapshot {
    /// Total number of renders observed.
    pub fn requests(&self) -> u64 {
        self.hits + self.misses + self.coalesced
    }

    /// Share of renders that did not start a computation.
    pub fn hit_rate(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            total => (self.hits + self.coalesced) as f64 / total as f64,
        }
    }

    /// Mean extraction time, if any extraction succeeded.
    pub fn mean_extraction_time(&self) -> Option<Duration> {
        (self.extractions > 0)
            .then(|| Duration::from_micros(self.extraction_time_us / self.extractions))
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as JSON (pretty printed).
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = vec![
            format!("Requests: {}", self.requests()),
            format!(
                "  Hits: {}  Misses: {}  Coalesced: {}",
                self.hits, self.misses, self.coalesced
            ),
            format!("  Hit rate: {:.1}%", self.hit_rate() * 100.0),
            format!(
                "  Extractions: {} ({} failed)",
                self.extractions, self.failures
            ),
        ];

        if let Some(mean) = self.mean_extraction_time() {
            lines.push(format!(
                "  Mean extraction time: {}us ({:.2}ms)",
                mean.as_micros(),
                mean.as_micros() as f64 / 1000.0
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = CacheMetrics::new();
        metrics.record_miss();
        metrics.record_extraction(Duration::from_micros(300));
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_coalesced();
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.coalesced, 1);
        assert_eq!(snapshot.extractions, 1);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.extraction_time_us, 300);
        assert_eq!(snapshot.requests(), 4);
    }

    #[test]
    fn test_hit_rate() {
        let snapshot = CacheMetricsSnapshot {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((snapshot.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheMetricsSnapshot::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_mean_extraction_time() {
        let snapshot = CacheMetricsSnapshot {
            extractions: 4,
            extraction_time_us: 1000,
            ..Default::default()
        };
        assert_eq!(snapshot.mean_extraction_time(), Some(Duration::from_micros(250)));
        assert_eq!(CacheMetricsSnapshot::default().mean_extraction_time(), None);
    }

    #[test]
    fn test_reset() {
        let metrics = CacheMetrics::new();
        metrics.record_hit();
        metrics.reset();
        assert_eq!(metrics.snapshot(), CacheMetricsSnapshot::default());
    }

    #[test]
    fn test_to_json() {
        let snapshot = CacheMetricsSnapshot {
            hits: 1,
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json()).unwrap();
        assert_eq!(value["hits"], 1);
        assert_eq!(value["misses"], 0);
    }

    #[test]
    fn test_summary() {
        let snapshot = CacheMetricsSnapshot {
            hits: 1,
            misses: 1,
            extractions: 1,
            extraction_time_us: 1500,
            ..Default::default()
        };
        let summary = snapshot.to_summary();
        assert!(summary.contains("Requests: 2"));
        assert!(summary.contains("Hit rate: 50.0%"));
        assert!(summary.contains("1500us (1.50ms)"));
    }
}
