//! Simulator configuration
//!
//! Provides CLI argument parsing and validation for `pktlat-sim`.

use crate::latency::constants::{
    DEFAULT_JITTER_THRESHOLD_US, DEFAULT_LATENCY_RATE_MS, MIN_LATENCY_RATE_MS,
};
use crate::sim::error::{Result, SimError};
use clap::Parser;
use std::time::Duration;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "pktlat-sim")]
#[command(about = "Latency probe simulation against a synthetic device under test")]
pub struct SimConfig {
    /// Number of ports to measure
    #[arg(long, default_value_t = 2)]
    pub ports: u16,

    /// Interval between probes in milliseconds
    #[arg(long, default_value_t = DEFAULT_LATENCY_RATE_MS)]
    pub rate_ms: u64,

    /// Jitter threshold in microseconds
    #[arg(
        long,
        default_value_t = DEFAULT_JITTER_THRESHOLD_US as i64,
        allow_negative_numbers = true
    )]
    pub jitter_us: i64,

    /// Simulated test duration in milliseconds
    #[arg(long, default_value_t = 2_000)]
    pub duration_ms: u64,

    /// Simulated time per poll-loop pass in microseconds
    #[arg(long, default_value_t = 5)]
    pub pass_us: u64,

    /// Fixed delay of the device under test in microseconds
    #[arg(long, default_value_t = 20)]
    pub base_delay_us: u64,

    /// Maximum extra random delay in microseconds
    #[arg(long, default_value_t = 80)]
    pub delay_variation_us: u64,

    /// Percentage of packets dropped by the device under test
    #[arg(long, default_value_t = 0.0)]
    pub loss_percent: f64,

    /// Bulk (non-probe) packets sent per port per pass
    #[arg(long, default_value_t = 4)]
    pub bulk_per_pass: usize,

    /// Seed for the simulated delay and loss
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Disable the progress bar
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ports: 2,
            rate_ms: DEFAULT_LATENCY_RATE_MS,
            jitter_us: DEFAULT_JITTER_THRESHOLD_US as i64,
            duration_ms: 2_000,
            pass_us: 5,
            base_delay_us: 20,
            delay_variation_us: 80,
            loss_percent: 0.0,
            bulk_per_pass: 4,
            seed: 42,
            quiet: true,
            log_level: "warn".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl SimConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn pass_interval(&self) -> Duration {
        Duration::from_micros(self.pass_us)
    }

    /// Number of poll-loop passes the simulation runs
    pub fn passes(&self) -> u64 {
        (self.duration_ms * 1_000) / self.pass_us.max(1)
    }

    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating simulation configuration");

        if self.ports == 0 {
            return Err(SimError::Config("ports must be > 0".into()));
        }
        if self.rate_ms < MIN_LATENCY_RATE_MS {
            return Err(SimError::Config(format!(
                "rate_ms must be >= {}",
                MIN_LATENCY_RATE_MS
            )));
        }
        if self.jitter_us < 0 {
            return Err(SimError::Config("jitter_us must be >= 0".into()));
        }
        if self.duration_ms == 0 {
            return Err(SimError::Config("duration_ms must be > 0".into()));
        }
        if self.pass_us == 0 {
            return Err(SimError::Config("pass_us must be > 0".into()));
        }
        if !(0.0..=100.0).contains(&self.loss_percent) {
            return Err(SimError::Config("loss_percent must be between 0 and 100".into()));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(SimError::Config(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        debug!("Simulation configuration validated successfully");
        Ok(())
    }
}
