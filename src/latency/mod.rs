//! Per-port latency and jitter measurement
//!
//! Three entry points run inside the generator's poll loops:
//! [`maybe_inject`] on the transmit side, [`on_packet_received`] on the
//! receive side, and [`LatencyStats::record_sample`] behind it. None of them
//! block, allocate or perform I/O.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod monitor;
pub mod port;
pub mod scheduler;
pub mod stats;

pub use clock::{
    duration_to_ticks, ticks_to_duration, ManualClock, MonotonicClock, TimestampSource,
};
pub use config::LatencyConfig;
pub use constants::*;
pub use error::{LatencyError, Result};
pub use logging::{init_logging, init_logging_with_config};
pub use matcher::on_packet_received;
pub use monitor::{LatencyMonitor, LatencySnapshot};
pub use port::{LatencyPort, LatencyPorts, LatencyRx, LatencyTx};
pub use scheduler::maybe_inject;
pub use stats::LatencyStats;
