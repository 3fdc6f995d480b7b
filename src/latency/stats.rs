//! Running latency statistics
//!
//! Every update is O(1) in time and space. No sample history is kept, so
//! percentiles are not available here; the average is the exact floor of the
//! arithmetic mean, tracked as a quotient plus remainder so it never drifts and
//! never needs an unbounded sum.

use std::time::Duration;
use tracing::trace;

/// Aggregated round-trip statistics for one port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyStats {
    min_ns: u64,
    max_ns: u64,
    avg_ns: u64,
    // sum of all samples == avg_ns * sample_count + avg_remainder
    avg_remainder: u64,
    previous_ns: u64,
    sample_count: u64,
    jitter_count: u64,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one round-trip sample into the aggregates.
    ///
    /// A sample counts as jitter when it differs from the previous sample by
    /// strictly more than `jitter_threshold`.
    #[inline]
    pub fn record_sample(&mut self, round_trip: Duration, jitter_threshold: Duration) {
        let rt = saturating_nanos(round_trip);

        if self.sample_count == 0 {
            *self = Self {
                min_ns: rt,
                max_ns: rt,
                avg_ns: rt,
                avg_remainder: 0,
                previous_ns: rt,
                sample_count: 1,
                jitter_count: 0,
            };
            return;
        }

        self.min_ns = self.min_ns.min(rt);
        self.max_ns = self.max_ns.max(rt);

        let count = i128::from(self.sample_count) + 1;
        let diff = i128::from(rt) - i128::from(self.avg_ns) + i128::from(self.avg_remainder);
        // floor of a mean of u64 samples always fits back into u64
        self.avg_ns = (i128::from(self.avg_ns) + diff.div_euclid(count)) as u64;
        self.avg_remainder = diff.rem_euclid(count) as u64;

        let delta = rt.abs_diff(self.previous_ns);
        if delta > saturating_nanos(jitter_threshold) {
            self.jitter_count += 1;
            trace!(delta_ns = delta, "Jitter sample");
        }

        self.previous_ns = rt;
        self.sample_count += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }

    /// Smallest round trip seen, zero before the first sample
    pub fn min(&self) -> Duration {
        Duration::from_nanos(self.min_ns)
    }

    pub fn max(&self) -> Duration {
        Duration::from_nanos(self.max_ns)
    }

    pub fn average(&self) -> Duration {
        Duration::from_nanos(self.avg_ns)
    }

    pub fn previous(&self) -> Duration {
        Duration::from_nanos(self.previous_ns)
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn jitter_count(&self) -> u64 {
        self.jitter_count
    }
}

#[inline]
fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(samples: &[u64], threshold: u64) -> LatencyStats {
        let mut stats = LatencyStats::new();
        for &s in samples {
            stats.record_sample(Duration::from_nanos(s), Duration::from_nanos(threshold));
        }
        stats
    }

    #[test]
    fn test_empty_stats() {
        let stats = LatencyStats::new();
        assert!(stats.is_empty());
        assert_eq!(stats.min(), Duration::ZERO);
        assert_eq!(stats.max(), Duration::ZERO);
        assert_eq!(stats.average(), Duration::ZERO);
        assert_eq!(stats.jitter_count(), 0);
    }

    #[test]
    fn test_single_sample() {
        let stats = feed(&[10], 5);
        assert_eq!(stats.min(), Duration::from_nanos(10));
        assert_eq!(stats.max(), Duration::from_nanos(10));
        assert_eq!(stats.average(), Duration::from_nanos(10));
        assert_eq!(stats.previous(), Duration::from_nanos(10));
        assert_eq!(stats.sample_count(), 1);
        assert_eq!(stats.jitter_count(), 0);
    }

    #[test]
    fn test_statistics_convergence() {
        let stats = feed(&[10, 20, 30], 50);
        assert_eq!(stats.min(), Duration::from_nanos(10));
        assert_eq!(stats.max(), Duration::from_nanos(30));
        assert_eq!(stats.average(), Duration::from_nanos(20));
        assert_eq!(stats.sample_count(), 3);
    }

    #[test]
    fn test_jitter_classification() {
        let stats = feed(&[10, 20, 21], 5);
        assert_eq!(stats.jitter_count(), 1);
    }

    #[test]
    fn test_jitter_threshold_is_exclusive() {
        let stats = feed(&[10, 15, 10], 5);
        assert_eq!(stats.jitter_count(), 0);
        let stats = feed(&[30, 10], 5);
        assert_eq!(stats.jitter_count(), 1);
    }

    #[test]
    fn test_average_does_not_drift() {
        // avg += (x - avg) / n alone would truncate this to 1
        let stats = feed(&[0, 3, 3], 0);
        assert_eq!(stats.average(), Duration::from_nanos(2));

        let mut stats = LatencyStats::new();
        for i in 0..10_000u64 {
            stats.record_sample(Duration::from_nanos(100 + i % 2), Duration::ZERO);
        }
        assert_eq!(stats.average(), Duration::from_nanos(100));
        stats.record_sample(Duration::from_nanos(101), Duration::ZERO);
        assert_eq!(stats.average(), Duration::from_nanos(100));
    }

    #[test]
    fn test_huge_samples_do_not_overflow() {
        let stats = feed(&[u64::MAX, u64::MAX, u64::MAX - 1], 0);
        assert_eq!(stats.max(), Duration::from_nanos(u64::MAX));
        assert_eq!(stats.average(), Duration::from_nanos(u64::MAX - 1));
    }
}
