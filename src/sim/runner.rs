//! Simulated poll loop
//!
//! Stands in for the generator's transmit and receive loops: every pass
//! advances a [`ManualClock`], sends bulk frames plus any due probe into each
//! port's [`DelayLine`], then drains whatever the device has released.

use crate::latency::{
    duration_to_ticks, LatencyPorts, LatencySnapshot, ManualClock, TimestampSource,
    NANOS_PER_SECOND,
};
use crate::protocol::ProbeRecord;
use crate::sim::config::SimConfig;
use crate::sim::dut::DelayLine;
use crate::sim::error::{Result, SimError};
use hdrhistogram::Histogram;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Histogram lower bound in nanoseconds
pub const HISTOGRAM_LOW_BOUND_NS: u64 = 1;

/// Histogram upper bound in nanoseconds
pub const HISTOGRAM_HIGH_BOUND_NS: u64 = 60_000_000_000;

/// Histogram significant digits for precision
pub const HISTOGRAM_SIGNIFICANT_DIGITS: u8 = 3;

/// Size of the bulk frames sent alongside probes
pub const BULK_FRAME_SIZE: usize = 64;

const PROGRESS_UPDATE_PASSES: u64 = 10_000;

/// Outcome of one port's simulated run
#[derive(Debug)]
pub struct PortResult {
    pub snapshot: LatencySnapshot,
    pub histogram: Histogram<u64>,
    pub bulk_sent: u64,
    pub bulk_received: u64,
    pub dropped: u64,
    pub in_flight: usize,
}

/// Results from a complete simulation
#[derive(Debug)]
pub struct SimulationResult {
    pub ports: Vec<PortResult>,
    pub simulated: Duration,
    pub passes: u64,
}

struct PortRun {
    dut: DelayLine,
    histogram: Histogram<u64>,
    bulk_sent: u64,
    bulk_received: u64,
}

pub fn run_simulation(config: &SimConfig) -> Result<SimulationResult> {
    config.validate()?;

    let clock = ManualClock::new(NANOS_PER_SECOND);
    let hz = clock.ticks_per_second();
    let mut ports = LatencyPorts::new(config.ports, hz);

    for port in ports.iter_mut() {
        port.set_rate_ms(config.rate_ms)?;
        port.set_jitter_threshold_us(config.jitter_us)?;
    }

    let base_delay = duration_to_ticks(Duration::from_micros(config.base_delay_us), hz);
    let variation = duration_to_ticks(Duration::from_micros(config.delay_variation_us), hz);
    let mut runs = (0..config.ports)
        .map(|id| {
            Ok(PortRun {
                dut: DelayLine::new(
                    base_delay,
                    variation,
                    config.loss_percent,
                    config.seed.wrapping_add(u64::from(id)),
                ),
                histogram: new_histogram()?,
                bulk_sent: 0,
                bulk_received: 0,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let passes = config.passes();
    let pass_ticks = duration_to_ticks(config.pass_interval(), hz).max(1);
    let progress = progress_bar(passes, config.quiet)?;
    let bulk_frame = bulk_frame();

    info!(
        ports = config.ports,
        passes,
        rate_ms = config.rate_ms,
        jitter_us = config.jitter_us,
        "Starting latency simulation"
    );

    for pass in 0..passes {
        let now = clock.advance(pass_ticks);

        for (port, run) in ports.iter_mut().zip(runs.iter_mut()) {
            let (mut tx, mut rx) = port.split();

            for _ in 0..config.bulk_per_pass {
                run.dut.transmit(&bulk_frame, now);
                run.bulk_sent += 1;
            }
            if let Some(record) = tx.maybe_inject(now) {
                run.dut.transmit(&record.encode(), now);
            }

            while let Some(frame) = run.dut.poll(now) {
                match rx.on_packet_received(&frame, now) {
                    Some(round_trip) => record_histogram(&mut run.histogram, round_trip)?,
                    None if !ProbeRecord::is_probe(&frame) => run.bulk_received += 1,
                    None => {}
                }
            }
        }

        if (pass + 1) % PROGRESS_UPDATE_PASSES == 0 {
            progress.set_position(pass + 1);
        }
    }
    progress.finish_and_clear();

    let results: Vec<PortResult> = ports
        .iter()
        .zip(runs)
        .map(|(port, run)| PortResult {
            snapshot: port.snapshot(),
            histogram: run.histogram,
            bulk_sent: run.bulk_sent,
            bulk_received: run.bulk_received,
            dropped: run.dut.dropped(),
            in_flight: run.dut.in_flight(),
        })
        .collect();

    for result in &results {
        debug!(
            port = result.snapshot.port_id,
            samples = result.snapshot.sample_count,
            jitter = result.snapshot.jitter_count,
            discarded = result.snapshot.discarded,
            "Port finished"
        );
    }

    Ok(SimulationResult {
        ports: results,
        simulated: Duration::from_nanos(clock.now_ticks()),
        passes,
    })
}

fn new_histogram() -> Result<Histogram<u64>> {
    Histogram::<u64>::new_with_bounds(
        HISTOGRAM_LOW_BOUND_NS,
        HISTOGRAM_HIGH_BOUND_NS,
        HISTOGRAM_SIGNIFICANT_DIGITS,
    )
    .map_err(|e| SimError::Report(format!("Failed to create histogram: {}", e)))
}

fn record_histogram(histogram: &mut Histogram<u64>, round_trip: Duration) -> Result<()> {
    let nanos = u64::try_from(round_trip.as_nanos()).unwrap_or(u64::MAX);
    let clamped = nanos.clamp(HISTOGRAM_LOW_BOUND_NS, HISTOGRAM_HIGH_BOUND_NS);
    histogram.record(clamped).map_err(|e| {
        warn!(latency_ns = nanos, error = %e, "Failed to record latency");
        SimError::Report(format!("Failed to record latency: {}", e))
    })
}

fn progress_bar(passes: u64, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(passes);
    pb.set_style(
        ProgressStyle::with_template(
            "Simulating {bar:40.cyan/blue} {pos:>9}/{len:9} passes [{elapsed_precise}]",
        )
        .map_err(|e| SimError::Report(format!("Failed to create progress style: {}", e)))?
        .progress_chars("█░"),
    );
    Ok(pb)
}

/// Ordinary traffic: an IPv4-looking frame that never carries the probe marker.
fn bulk_frame() -> [u8; BULK_FRAME_SIZE] {
    let mut frame = [0u8; BULK_FRAME_SIZE];
    frame[..2].copy_from_slice(&[0x45, 0x00]);
    for (i, byte) in frame.iter_mut().enumerate().skip(2) {
        *byte = (i * 3) as u8;
    }
    frame
}
