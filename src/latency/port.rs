//! Per-port latency state
//!
//! A [`LatencyPort`] owns one port's configuration, statistics and counters.
//! The transmit side (scheduler) and receive side (matcher) touch disjoint
//! parts of it; [`LatencyPort::split`] hands them out as separate borrows so
//! each half can be driven from its own core with exactly one writer each.

use crate::latency::clock::{duration_to_ticks, TimestampSource};
use crate::latency::config::LatencyConfig;
use crate::latency::error::{LatencyError, Result};
use crate::latency::monitor::{LatencyMonitor, LatencySnapshot, PublishedLatency};
use crate::latency::stats::LatencyStats;
use crate::protocol::SequenceNumber;
use std::sync::Arc;
use tracing::info;

/// Transmit-side state, written only by the scheduler
#[derive(Debug, Default)]
pub(crate) struct TxState {
    pub(crate) next_sequence: SequenceNumber,
    pub(crate) last_injection: Option<u64>,
    pub(crate) interval_ticks: u64,
    pub(crate) probes_sent: u64,
}

/// Receive-side diagnostics, written only by the matcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RxCounters {
    pub(crate) received: u64,
    pub(crate) discarded: u64,
    pub(crate) out_of_order: u64,
    pub(crate) sequence_gaps: u64,
    pub(crate) resyncs: u64,
}

/// Receive-side state, written only by the matcher and accumulator
#[derive(Debug, Default)]
pub(crate) struct RxState {
    pub(crate) stats: LatencyStats,
    pub(crate) counters: RxCounters,
    pub(crate) expected_sequence: Option<SequenceNumber>,
    pub(crate) max_round_trip_ticks: u64,
}

/// Latency measurement state for a single port
#[derive(Debug)]
pub struct LatencyPort {
    port_id: u16,
    ticks_per_second: u64,
    config: LatencyConfig,
    tx: TxState,
    rx: RxState,
    published: Arc<PublishedLatency>,
}

/// Transmit half of a port, see [`LatencyPort::split`]
pub struct LatencyTx<'a> {
    pub(crate) port_id: u16,
    pub(crate) state: &'a mut TxState,
    pub(crate) published: &'a PublishedLatency,
}

/// Receive half of a port, see [`LatencyPort::split`]
pub struct LatencyRx<'a> {
    pub(crate) port_id: u16,
    pub(crate) ticks_per_second: u64,
    pub(crate) config: &'a LatencyConfig,
    pub(crate) state: &'a mut RxState,
    pub(crate) published: &'a PublishedLatency,
}

impl LatencyPort {
    /// Creates a port already set up with default configuration.
    pub fn new(port_id: u16, ticks_per_second: u64) -> Self {
        let mut port = Self {
            port_id,
            ticks_per_second: ticks_per_second.max(1),
            config: LatencyConfig::default(),
            tx: TxState::default(),
            rx: RxState::default(),
            published: Arc::new(PublishedLatency::default()),
        };
        port.setup();
        port
    }

    pub fn for_clock<C: TimestampSource + ?Sized>(port_id: u16, clock: &C) -> Self {
        Self::new(port_id, clock.ticks_per_second())
    }

    /// Restores default configuration and clears all statistics and counters.
    ///
    /// Safe to call at any time to restart a latency test on this port.
    pub fn setup(&mut self) {
        self.config = LatencyConfig::default();
        self.tx = TxState::default();
        self.rx = RxState::default();
        self.refresh_ticks();

        self.published.publish_config(&self.config);
        self.published.publish_sent(0);
        self.published.publish_rx(&self.rx.stats, &self.rx.counters);

        info!(
            port = self.port_id,
            rate_ms = self.config.rate_ms(),
            jitter_threshold_us = self.config.jitter_threshold().as_micros() as u64,
            probe_size = self.config.probe_payload_size(),
            "Latency port set up"
        );
    }

    pub fn port_id(&self) -> u16 {
        self.port_id
    }

    pub fn ticks_per_second(&self) -> u64 {
        self.ticks_per_second
    }

    pub fn config(&self) -> &LatencyConfig {
        &self.config
    }

    pub fn stats(&self) -> &LatencyStats {
        &self.rx.stats
    }

    pub fn probes_sent(&self) -> u64 {
        self.tx.probes_sent
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        let stats = &self.rx.stats;
        let counters = &self.rx.counters;
        LatencySnapshot {
            port_id: self.port_id,
            min: stats.min(),
            max: stats.max(),
            average: stats.average(),
            sample_count: stats.sample_count(),
            jitter_count: stats.jitter_count(),
            probes_sent: self.tx.probes_sent,
            probes_received: counters.received,
            discarded: counters.discarded,
            out_of_order: counters.out_of_order,
            sequence_gaps: counters.sequence_gaps,
            resyncs: counters.resyncs,
            rate_ms: self.config.rate_ms(),
            jitter_threshold: self.config.jitter_threshold(),
        }
    }

    /// Handle for reading this port's figures from another thread.
    pub fn monitor(&self) -> LatencyMonitor {
        LatencyMonitor::new(self.port_id, Arc::clone(&self.published))
    }

    pub fn set_rate_ms(&mut self, rate_ms: u64) -> Result<()> {
        self.config.set_rate_ms(rate_ms)?;
        self.config_changed();
        Ok(())
    }

    pub fn set_jitter_threshold_us(&mut self, threshold_us: i64) -> Result<()> {
        self.config.set_jitter_threshold_us(threshold_us)?;
        self.config_changed();
        Ok(())
    }

    pub fn set_max_round_trip_ms(&mut self, max_ms: u64) -> Result<()> {
        self.config.set_max_round_trip_ms(max_ms)?;
        self.config_changed();
        Ok(())
    }

    /// Borrows the transmit and receive halves separately.
    pub fn split(&mut self) -> (LatencyTx<'_>, LatencyRx<'_>) {
        let tx = LatencyTx {
            port_id: self.port_id,
            state: &mut self.tx,
            published: &self.published,
        };
        let rx = LatencyRx {
            port_id: self.port_id,
            ticks_per_second: self.ticks_per_second,
            config: &self.config,
            state: &mut self.rx,
            published: &self.published,
        };
        (tx, rx)
    }

    pub fn tx(&mut self) -> LatencyTx<'_> {
        self.split().0
    }

    pub fn rx(&mut self) -> LatencyRx<'_> {
        self.split().1
    }

    fn config_changed(&mut self) {
        self.refresh_ticks();
        self.published.publish_config(&self.config);
        info!(
            port = self.port_id,
            rate_ms = self.config.rate_ms(),
            jitter_threshold_us = self.config.jitter_threshold().as_micros() as u64,
            max_round_trip_ms = self.config.max_round_trip().as_millis() as u64,
            "Latency configuration changed"
        );
    }

    fn refresh_ticks(&mut self) {
        self.tx.interval_ticks =
            duration_to_ticks(self.config.injection_interval(), self.ticks_per_second).max(1);
        self.rx.max_round_trip_ticks =
            duration_to_ticks(self.config.max_round_trip(), self.ticks_per_second);
    }
}

/// All latency ports managed by one orchestrator, indexed by port id
#[derive(Debug)]
pub struct LatencyPorts {
    ports: Vec<LatencyPort>,
}

impl LatencyPorts {
    /// Creates ports `0..count`, all sharing one clock frequency.
    pub fn new(count: u16, ticks_per_second: u64) -> Self {
        Self {
            ports: (0..count)
                .map(|id| LatencyPort::new(id, ticks_per_second))
                .collect(),
        }
    }

    pub fn setup_all(&mut self) {
        self.ports.iter_mut().for_each(LatencyPort::setup);
    }

    pub fn get(&self, port_id: u16) -> Result<&LatencyPort> {
        self.ports
            .get(usize::from(port_id))
            .ok_or(LatencyError::UnknownPort(port_id))
    }

    pub fn get_mut(&mut self, port_id: u16) -> Result<&mut LatencyPort> {
        self.ports
            .get_mut(usize::from(port_id))
            .ok_or(LatencyError::UnknownPort(port_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LatencyPort> {
        self.ports.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LatencyPort> {
        self.ports.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latency::clock::MockTimestampSource;
    use std::time::Duration;

    const HZ: u64 = 1_000_000;

    #[test]
    fn test_new_port_is_set_up() {
        let port = LatencyPort::new(2, HZ);
        assert_eq!(port.port_id(), 2);
        assert_eq!(port.config(), &LatencyConfig::default());
        assert!(port.stats().is_empty());
        assert_eq!(port.tx.interval_ticks, 10_000);
        assert_eq!(port.rx.max_round_trip_ticks, 1_000_000);
    }

    #[test]
    fn test_for_clock_uses_clock_frequency() {
        let mut clock = MockTimestampSource::new();
        clock.expect_ticks_per_second().times(1).returning(|| 2_000);
        let port = LatencyPort::for_clock(0, &clock);
        assert_eq!(port.ticks_per_second(), 2_000);
        assert_eq!(port.tx.interval_ticks, 20);
    }

    #[test]
    fn test_setup_is_idempotent() {
        let mut port = LatencyPort::new(0, HZ);
        port.set_rate_ms(1).unwrap();
        port.rx
            .stats
            .record_sample(Duration::from_micros(10), Duration::from_micros(50));
        port.tx.probes_sent = 4;

        port.setup();
        port.setup();

        let snapshot = port.snapshot();
        assert_eq!(snapshot.sample_count, 0);
        assert_eq!(snapshot.min, Duration::ZERO);
        assert_eq!(snapshot.max, Duration::ZERO);
        assert_eq!(snapshot.average, Duration::ZERO);
        assert_eq!(snapshot.probes_sent, 0);
        assert_eq!(snapshot.rate_ms, 10);
        assert_eq!(port.monitor().snapshot(), snapshot);
    }

    #[test]
    fn test_rejected_config_keeps_previous() {
        let mut port = LatencyPort::new(0, HZ);
        port.set_rate_ms(5).unwrap();
        assert!(matches!(port.set_rate_ms(0), Err(LatencyError::Config(_))));
        assert!(port.set_jitter_threshold_us(-10).is_err());
        assert_eq!(port.config().rate_ms(), 5);
        assert_eq!(port.tx.interval_ticks, 5_000);
        assert_eq!(port.monitor().snapshot().rate_ms, 5);
        assert_eq!(
            port.monitor().snapshot().jitter_threshold,
            Duration::from_micros(50)
        );
    }

    #[test]
    fn test_port_collection() {
        let mut ports = LatencyPorts::new(3, HZ);
        assert_eq!(ports.len(), 3);
        assert!(!ports.is_empty());
        assert_eq!(ports.get(2).unwrap().port_id(), 2);
        assert_eq!(ports.get(3).unwrap_err(), LatencyError::UnknownPort(3));

        ports.get_mut(1).unwrap().set_rate_ms(2).unwrap();
        assert_eq!(ports.get(1).unwrap().config().rate_ms(), 2);
        assert_eq!(ports.get(0).unwrap().config().rate_ms(), 10);

        ports.setup_all();
        assert!(ports.iter().all(|p| p.config().rate_ms() == 10));
    }
}
