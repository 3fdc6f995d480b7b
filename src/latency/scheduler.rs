//! Probe injection scheduling
//!
//! Called once per transmit-loop pass per port. Deciding to inject is kept
//! apart from transmitting: the caller encodes the returned record and hands
//! it to its own transmit path exactly once.

use crate::latency::port::{LatencyPort, LatencyTx};
use crate::protocol::ProbeRecord;
use tracing::{debug, trace};

impl LatencyTx<'_> {
    /// Returns a probe to send if at least one injection interval has passed
    /// since the previous probe, otherwise `None` with no state change.
    #[inline]
    pub fn maybe_inject(&mut self, now: u64) -> Option<ProbeRecord> {
        let state = &mut *self.state;

        if let Some(last) = state.last_injection {
            // a regressing clock reads as "no time elapsed"
            if now.saturating_sub(last) < state.interval_ticks {
                return None;
            }
        }

        let sequence = state.next_sequence.post_increment();
        state.last_injection = Some(now);
        state.probes_sent += 1;
        self.published.publish_sent(state.probes_sent);

        debug!(
            port = self.port_id,
            sequence = sequence.0,
            send_timestamp = now,
            "Latency probe scheduled"
        );

        Some(ProbeRecord::new(sequence, now))
    }

    /// Ticks until the next probe is due; zero when one is due now.
    pub fn ticks_until_due(&self, now: u64) -> u64 {
        match self.state.last_injection {
            None => 0,
            Some(last) => {
                let due = last.saturating_add(self.state.interval_ticks);
                let remaining = due.saturating_sub(now);
                trace!(port = self.port_id, remaining, "Next probe");
                remaining
            }
        }
    }
}

/// Scheduler entry point for ports driven from a single core.
#[inline]
pub fn maybe_inject(port: &mut LatencyPort, now: u64) -> Option<ProbeRecord> {
    port.tx().maybe_inject(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SequenceNumber;

    const HZ: u64 = 1_000;

    #[test]
    fn test_rate_gating() {
        let mut port = LatencyPort::new(0, HZ);
        port.set_rate_ms(10).unwrap();
        let interval = 10;
        let t = 500;

        let first = maybe_inject(&mut port, t).expect("first probe");
        assert!(maybe_inject(&mut port, t + interval - 1).is_none());
        let second = maybe_inject(&mut port, t + interval).expect("second probe");

        assert_eq!(first.sequence, SequenceNumber(0));
        assert_eq!(second.sequence, SequenceNumber(1));
        assert_eq!(first.send_timestamp, t);
        assert_eq!(second.send_timestamp, t + interval);
        assert_eq!(port.probes_sent(), 2);
    }

    #[test]
    fn test_sequence_strictly_increases() {
        let mut port = LatencyPort::new(0, HZ);
        port.set_rate_ms(1).unwrap();
        let mut previous = None;
        for now in 0..1_000u64 {
            let probe = maybe_inject(&mut port, now).expect("probe every tick");
            if let Some(prev) = previous {
                assert_eq!(probe.sequence.0, prev + 1);
            }
            previous = Some(probe.sequence.0);
        }
    }

    #[test]
    fn test_clock_regression_does_not_inject() {
        let mut port = LatencyPort::new(0, HZ);
        assert!(maybe_inject(&mut port, 1_000).is_some());
        assert!(maybe_inject(&mut port, 10).is_none());
        assert!(maybe_inject(&mut port, 1_010).is_some());
    }

    #[test]
    fn test_rate_change_applies_to_next_decision() {
        let mut port = LatencyPort::new(0, HZ);
        assert!(maybe_inject(&mut port, 0).is_some());
        assert!(maybe_inject(&mut port, 5).is_none());
        port.set_rate_ms(5).unwrap();
        assert!(maybe_inject(&mut port, 5).is_some());
    }

    #[test]
    fn test_ticks_until_due() {
        let mut port = LatencyPort::new(0, HZ);
        let mut tx = port.tx();
        assert_eq!(tx.ticks_until_due(0), 0);
        assert!(tx.maybe_inject(100).is_some());
        assert_eq!(tx.ticks_until_due(104), 6);
        assert_eq!(tx.ticks_until_due(200), 0);
    }

    #[test]
    fn test_sequence_wraps_without_error() {
        let mut port = LatencyPort::new(0, HZ);
        port.tx().state.next_sequence = SequenceNumber(u32::MAX);
        let a = maybe_inject(&mut port, 0).unwrap();
        let b = maybe_inject(&mut port, 10).unwrap();
        assert_eq!(a.sequence, SequenceNumber(u32::MAX));
        assert_eq!(b.sequence, SequenceNumber(0));
    }
}
