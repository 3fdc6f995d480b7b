//! pktlat - Latency and jitter probes for a poll-mode traffic generator
//!
//! This library injects tagged probe packets at a controlled rate, recognises
//! them when they come back from the device under test, and keeps running
//! round-trip statistics (min, max, average, jitter) per port without
//! disturbing the generator's transmit and receive loops.

pub mod latency;
pub mod protocol;
pub mod sim;
