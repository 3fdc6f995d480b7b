//! Matching returned probes and turning them into round-trip samples
//!
//! Every probe carries its own send timestamp, so nothing is remembered per
//! outstanding probe. Sequence numbers only feed ordering diagnostics.

use crate::latency::clock::ticks_to_duration;
use crate::latency::constants::SEQUENCE_RESYNC_WINDOW;
use crate::latency::port::{LatencyPort, LatencyRx};
use crate::protocol::{ProbeRecord, SequenceNumber};
use std::time::Duration;
use tracing::{debug, trace};

impl LatencyRx<'_> {
    /// Inspects one received payload.
    ///
    /// Returns the round trip when the payload is a probe with a plausible
    /// timestamp. Non-probe traffic costs a length and marker check.
    #[inline]
    pub fn on_packet_received(&mut self, payload: &[u8], now: u64) -> Option<Duration> {
        if !ProbeRecord::is_probe(payload) {
            return None;
        }
        let record = ProbeRecord::decode(payload)?;

        self.state.counters.received += 1;
        self.track_sequence(record.sequence);

        let round_trip = match now.checked_sub(record.send_timestamp) {
            Some(ticks) if ticks <= self.state.max_round_trip_ticks => {
                ticks_to_duration(ticks, self.ticks_per_second)
            }
            _ => {
                self.state.counters.discarded += 1;
                debug!(
                    port = self.port_id,
                    sequence = record.sequence.0,
                    send_timestamp = record.send_timestamp,
                    now,
                    "Discarded implausible round trip"
                );
                self.published.publish_rx(&self.state.stats, &self.state.counters);
                return None;
            }
        };

        self.state
            .stats
            .record_sample(round_trip, self.config.jitter_threshold());
        self.published.publish_rx(&self.state.stats, &self.state.counters);

        trace!(
            port = self.port_id,
            sequence = record.sequence.0,
            round_trip_ns = round_trip.as_nanos() as u64,
            "Latency sample"
        );

        Some(round_trip)
    }

    fn track_sequence(&mut self, sequence: SequenceNumber) {
        let counters = &mut self.state.counters;
        if let Some(expected) = self.state.expected_sequence {
            let distance = expected.distance_to(sequence);
            if distance.unsigned_abs() > SEQUENCE_RESYNC_WINDOW {
                counters.resyncs += 1;
                debug!(
                    port = self.port_id,
                    expected = expected.0,
                    received = sequence.0,
                    "Probe sequence resynchronised"
                );
            } else if distance < 0 {
                counters.out_of_order += 1;
                debug!(
                    port = self.port_id,
                    expected = expected.0,
                    received = sequence.0,
                    "Late or duplicate probe"
                );
                return;
            } else if distance > 0 {
                counters.sequence_gaps += distance as u64;
                debug!(
                    port = self.port_id,
                    expected = expected.0,
                    received = sequence.0,
                    missing = distance,
                    "Probe sequence gap"
                );
            }
        }
        self.state.expected_sequence = Some(SequenceNumber(sequence.0.wrapping_add(1)));
    }
}

/// Receive entry point for ports driven from a single core.
#[inline]
pub fn on_packet_received(port: &mut LatencyPort, payload: &[u8], now: u64) -> Option<Duration> {
    port.rx().on_packet_received(payload, now)
}
