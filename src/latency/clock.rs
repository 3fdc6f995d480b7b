//! Timestamp source capability
//!
//! The latency subsystem only ever reads a clock. Production code uses
//! [`MonotonicClock`]; tests and the simulator drive a [`ManualClock`] by hand.

use crate::latency::constants::NANOS_PER_SECOND;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic, non-blocking tick counter with a known frequency
pub trait TimestampSource: Send + Sync {
    /// Current raw tick value
    fn now_ticks(&self) -> u64;

    /// Tick frequency in Hz
    fn ticks_per_second(&self) -> u64;
}

/// Nanosecond ticks measured from the moment the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimestampSource for MonotonicClock {
    #[inline]
    fn now_ticks(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn ticks_per_second(&self) -> u64 {
        NANOS_PER_SECOND
    }
}

/// Clock that only moves when told to
///
/// Safe to share between a transmit and a receive thread; reads and writes are
/// single atomic operations.
#[derive(Debug)]
pub struct ManualClock {
    ticks: AtomicU64,
    hz: u64,
}

impl ManualClock {
    pub fn new(ticks_per_second: u64) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            hz: ticks_per_second.max(1),
        }
    }

    pub fn set(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::Relaxed);
    }

    /// Moves the clock forward, wrapping at `u64::MAX`, and returns the new reading.
    pub fn advance(&self, ticks: u64) -> u64 {
        self.ticks
            .fetch_add(ticks, Ordering::Relaxed)
            .wrapping_add(ticks)
    }

    pub fn advance_by(&self, elapsed: Duration) -> u64 {
        self.advance(duration_to_ticks(elapsed, self.hz))
    }
}

impl TimestampSource for ManualClock {
    #[inline]
    fn now_ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    fn ticks_per_second(&self) -> u64 {
        self.hz
    }
}

/// Converts a tick count to a `Duration`, saturating at `u64::MAX` nanoseconds.
#[inline]
pub fn ticks_to_duration(ticks: u64, ticks_per_second: u64) -> Duration {
    let nanos =
        u128::from(ticks) * u128::from(NANOS_PER_SECOND) / u128::from(ticks_per_second.max(1));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Converts a `Duration` to ticks, rounding down and saturating at `u64::MAX`.
pub fn duration_to_ticks(duration: Duration, ticks_per_second: u64) -> u64 {
    let ticks =
        duration.as_nanos() * u128::from(ticks_per_second) / u128::from(NANOS_PER_SECOND);
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    mock! {
        pub TimestampSource {}

        impl TimestampSource for TimestampSource {
            fn now_ticks(&self) -> u64;
            fn ticks_per_second(&self) -> u64;
        }
    }

    #[test]
    fn test_tick_conversion() {
        assert_eq!(ticks_to_duration(1_000, 1_000_000), Duration::from_millis(1));
        assert_eq!(ticks_to_duration(3, 1_000_000_000), Duration::from_nanos(3));
        assert_eq!(duration_to_ticks(Duration::from_micros(50), 2_000_000_000), 100_000);
        assert_eq!(duration_to_ticks(Duration::from_millis(10), 1_000), 10);
        assert_eq!(ticks_to_duration(u64::MAX, 1), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000_000);
        assert_eq!(clock.now_ticks(), 0);
        assert_eq!(clock.advance(5), 5);
        assert_eq!(clock.advance_by(Duration::from_millis(1)), 1_005);
        clock.set(42);
        assert_eq!(clock.now_ticks(), 42);
        assert_eq!(clock.ticks_per_second(), 1_000_000);
    }

    #[test]
    fn test_manual_clock_advance_wraps() {
        let clock = ManualClock::new(1_000);
        clock.set(u64::MAX - 1);
        assert_eq!(clock.advance(3), 1);
        assert_eq!(clock.now_ticks(), 1);
    }

    #[test]
    fn test_monotonic_clock_does_not_regress() {
        let clock = MonotonicClock::new();
        let a = clock.now_ticks();
        let b = clock.now_ticks();
        assert!(b >= a);
        assert_eq!(clock.ticks_per_second(), NANOS_PER_SECOND);
    }

    #[test]
    fn test_mock_clock() {
        let mut clock = MockTimestampSource::new();
        clock.expect_now_ticks().times(1).returning(|| 77);
        clock.expect_ticks_per_second().returning(|| 1_000);
        assert_eq!(
            ticks_to_duration(clock.now_ticks(), clock.ticks_per_second()),
            Duration::from_millis(77)
        );
    }
}

#[cfg(test)]
pub use tests::MockTimestampSource;
