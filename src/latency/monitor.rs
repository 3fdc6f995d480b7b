//! Published latency figures for display and reporting threads
//!
//! The poll loop publishes with plain atomic stores and never waits on a
//! reader. Receive-side figures are written under a sequence counter so a
//! reader always sees min, average and max from the same sample.

use crate::latency::config::LatencyConfig;
use crate::latency::port::RxCounters;
use crate::latency::stats::LatencyStats;
use std::hint;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Point-in-time copy of a port's latency statistics, counters and settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatencySnapshot {
    pub port_id: u16,
    pub min: Duration,
    pub max: Duration,
    pub average: Duration,
    pub sample_count: u64,
    pub jitter_count: u64,
    pub probes_sent: u64,
    pub probes_received: u64,
    pub discarded: u64,
    pub out_of_order: u64,
    pub sequence_gaps: u64,
    pub resyncs: u64,
    pub rate_ms: u64,
    pub jitter_threshold: Duration,
}

/// Counter occupying a whole cache line
#[derive(Debug, Default)]
#[repr(C, align(64))]
struct CacheLineCounter {
    value: AtomicU64,
}

impl CacheLineCounter {
    #[inline]
    fn load(&self, order: Ordering) -> u64 {
        self.value.load(order)
    }

    #[inline]
    fn store(&self, val: u64, order: Ordering) {
        self.value.store(val, order)
    }
}

/// `probes_sent` is written by the transmit core and sits on its own cache line.
#[derive(Debug, Default)]
pub(crate) struct PublishedLatency {
    version: AtomicU64,
    min_ns: AtomicU64,
    max_ns: AtomicU64,
    avg_ns: AtomicU64,
    sample_count: AtomicU64,
    jitter_count: AtomicU64,
    probes_received: AtomicU64,
    discarded: AtomicU64,
    out_of_order: AtomicU64,
    sequence_gaps: AtomicU64,
    resyncs: AtomicU64,
    probes_sent: CacheLineCounter,
    rate_ms: AtomicU64,
    jitter_threshold_ns: AtomicU64,
}

impl PublishedLatency {
    /// Must only be called from the single receive-side writer of the port.
    pub(crate) fn publish_rx(&self, stats: &LatencyStats, counters: &RxCounters) {
        let version = self.version.load(Ordering::Relaxed);
        self.version.store(version.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        self.min_ns.store(nanos(stats.min()), Ordering::Relaxed);
        self.max_ns.store(nanos(stats.max()), Ordering::Relaxed);
        self.avg_ns.store(nanos(stats.average()), Ordering::Relaxed);
        self.sample_count.store(stats.sample_count(), Ordering::Relaxed);
        self.jitter_count.store(stats.jitter_count(), Ordering::Relaxed);
        self.probes_received.store(counters.received, Ordering::Relaxed);
        self.discarded.store(counters.discarded, Ordering::Relaxed);
        self.out_of_order.store(counters.out_of_order, Ordering::Relaxed);
        self.sequence_gaps.store(counters.sequence_gaps, Ordering::Relaxed);
        self.resyncs.store(counters.resyncs, Ordering::Relaxed);

        self.version.store(version.wrapping_add(2), Ordering::Release);
    }

    #[inline]
    pub(crate) fn publish_sent(&self, probes_sent: u64) {
        self.probes_sent.store(probes_sent, Ordering::Relaxed);
    }

    pub(crate) fn publish_config(&self, config: &LatencyConfig) {
        self.rate_ms.store(config.rate_ms(), Ordering::Relaxed);
        self.jitter_threshold_ns.store(nanos(config.jitter_threshold()), Ordering::Relaxed);
    }

    fn read(&self, port_id: u16) -> LatencySnapshot {
        loop {
            let before = self.version.load(Ordering::Acquire);
            if before % 2 == 1 {
                hint::spin_loop();
                continue;
            }

            let snapshot = LatencySnapshot {
                port_id,
                min: Duration::from_nanos(self.min_ns.load(Ordering::Relaxed)),
                max: Duration::from_nanos(self.max_ns.load(Ordering::Relaxed)),
                average: Duration::from_nanos(self.avg_ns.load(Ordering::Relaxed)),
                sample_count: self.sample_count.load(Ordering::Relaxed),
                jitter_count: self.jitter_count.load(Ordering::Relaxed),
                probes_sent: self.probes_sent.load(Ordering::Relaxed),
                probes_received: self.probes_received.load(Ordering::Relaxed),
                discarded: self.discarded.load(Ordering::Relaxed),
                out_of_order: self.out_of_order.load(Ordering::Relaxed),
                sequence_gaps: self.sequence_gaps.load(Ordering::Relaxed),
                resyncs: self.resyncs.load(Ordering::Relaxed),
                rate_ms: self.rate_ms.load(Ordering::Relaxed),
                jitter_threshold: Duration::from_nanos(
                    self.jitter_threshold_ns.load(Ordering::Relaxed),
                ),
            };

            fence(Ordering::Acquire);
            if self.version.load(Ordering::Relaxed) == before {
                return snapshot;
            }
        }
    }
}

/// Read-only handle onto a port's published figures
///
/// Cheap to clone and safe to move to another thread. Reading never blocks
/// the port's poll loop.
#[derive(Debug, Clone)]
pub struct LatencyMonitor {
    port_id: u16,
    published: Arc<PublishedLatency>,
}

impl LatencyMonitor {
    pub(crate) fn new(port_id: u16, published: Arc<PublishedLatency>) -> Self {
        Self { port_id, published }
    }

    pub fn port_id(&self) -> u16 {
        self.port_id
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        self.published.read(self.port_id)
    }
}

#[inline]
fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
