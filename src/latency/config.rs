use crate::latency::constants::*;
use crate::latency::error::{LatencyError, Result};
use crate::protocol::PROBE_PAYLOAD_SIZE;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-port latency measurement settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyConfig {
    injection_interval: Duration,
    jitter_threshold: Duration,
    max_round_trip: Duration,
    probe_payload_size: usize,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            injection_interval: Duration::from_millis(DEFAULT_LATENCY_RATE_MS),
            jitter_threshold: Duration::from_micros(DEFAULT_JITTER_THRESHOLD_US),
            max_round_trip: Duration::from_millis(DEFAULT_MAX_ROUND_TRIP_MS),
            probe_payload_size: PROBE_PAYLOAD_SIZE,
        }
    }
}

impl LatencyConfig {
    pub fn injection_interval(&self) -> Duration {
        self.injection_interval
    }

    /// Injection rate as configured, in milliseconds
    pub fn rate_ms(&self) -> u64 {
        self.injection_interval.as_millis() as u64
    }

    pub fn jitter_threshold(&self) -> Duration {
        self.jitter_threshold
    }

    pub fn max_round_trip(&self) -> Duration {
        self.max_round_trip
    }

    pub fn probe_payload_size(&self) -> usize {
        self.probe_payload_size
    }

    /// Sets the probe interval. Values below 1 ms are rejected and the
    /// previous interval is kept.
    pub fn set_rate_ms(&mut self, rate_ms: u64) -> Result<()> {
        if rate_ms < MIN_LATENCY_RATE_MS {
            warn!(
                rate_ms,
                current_ms = self.rate_ms(),
                "Rejected latency rate below minimum"
            );
            return Err(LatencyError::Config(format!(
                "rate must be >= {} ms, got {}",
                MIN_LATENCY_RATE_MS, rate_ms
            )));
        }
        self.injection_interval = Duration::from_millis(rate_ms);
        debug!(rate_ms, "Latency rate updated");
        Ok(())
    }

    /// Sets the jitter threshold. Negative values are rejected.
    pub fn set_jitter_threshold_us(&mut self, threshold_us: i64) -> Result<()> {
        let Ok(us) = u64::try_from(threshold_us) else {
            warn!(
                threshold_us,
                current_us = self.jitter_threshold.as_micros() as u64,
                "Rejected negative jitter threshold"
            );
            return Err(LatencyError::Config(format!(
                "jitter threshold must be >= 0 us, got {}",
                threshold_us
            )));
        };
        self.jitter_threshold = Duration::from_micros(us);
        debug!(threshold_us, "Jitter threshold updated");
        Ok(())
    }

    /// Sets the sanity bound above which round trips are discarded.
    pub fn set_max_round_trip_ms(&mut self, max_ms: u64) -> Result<()> {
        if max_ms == 0 {
            warn!("Rejected zero round-trip bound");
            return Err(LatencyError::Config("max round trip must be > 0 ms".into()));
        }
        self.max_round_trip = Duration::from_millis(max_ms);
        debug!(max_ms, "Round-trip bound updated");
        Ok(())
    }
}
