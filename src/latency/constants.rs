//! Default latency measurement settings

/// Default interval between probes in milliseconds
pub const DEFAULT_LATENCY_RATE_MS: u64 = 10;

/// Smallest accepted probe interval in milliseconds
pub const MIN_LATENCY_RATE_MS: u64 = 1;

/// Default jitter threshold in microseconds
pub const DEFAULT_JITTER_THRESHOLD_US: u64 = 50;

/// Round trips above this bound are discarded as implausible
pub const DEFAULT_MAX_ROUND_TRIP_MS: u64 = 1_000;

/// Sequence jumps larger than this, in either direction, restart ordering
/// tracking instead of counting as a gap or a late probe
pub const SEQUENCE_RESYNC_WINDOW: u32 = 64;

/// Tick frequency of [`crate::latency::MonotonicClock`]
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;
