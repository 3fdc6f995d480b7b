use crate::sim::runner::{PortResult, SimulationResult};
use colored::*;
use std::time::Duration;
use tracing::info;

/// Percentiles shown per port
const PERCENTILES: [(f64, &str); 4] = [
    (0.50, "P50"),
    (0.90, "P90"),
    (0.99, "P99"),
    (0.999, "P99.9"),
];

/// Jitter share above which a port is flagged
const JITTER_WARN_PERCENT: f64 = 1.0;

/// Reporter for printing simulation results
pub struct Reporter;

impl Reporter {
    /// Formats a duration in microseconds with three decimals.
    pub fn format_us(d: Duration) -> String {
        format!("{:.3}us", d.as_nanos() as f64 / 1_000.0)
    }

    /// Share of `part` in `total` as a percentage, zero when `total` is zero.
    pub fn percentage(part: u64, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            part as f64 * 100.0 / total as f64
        }
    }

    pub fn print_results(result: &SimulationResult) {
        println!();
        println!("{}", "Latency Probe Results".bold());
        println!(
            "Simulated {:.3}s over {} poll passes\n",
            result.simulated.as_secs_f64(),
            result.passes
        );

        for port in &result.ports {
            Self::print_port(port);
        }

        info!(ports = result.ports.len(), "Results printed");
    }

    fn print_port(port: &PortResult) {
        let s = &port.snapshot;
        println!("{}", format!("Port {}", s.port_id).bold().underline());

        println!(
            "  Probes:   sent {} | received {} | discarded {} | late {} | gaps {} | resyncs {}",
            s.probes_sent,
            s.probes_received,
            s.discarded,
            s.out_of_order,
            s.sequence_gaps,
            s.resyncs
        );
        println!(
            "  Bulk:     sent {} | received {} | dropped by DUT {} | in flight {}",
            port.bulk_sent, port.bulk_received, port.dropped, port.in_flight
        );
        println!(
            "  Settings: rate {}ms | jitter threshold {}",
            s.rate_ms,
            Self::format_us(s.jitter_threshold)
        );

        if s.sample_count == 0 {
            println!("  {}\n", "No probe samples received".yellow());
            return;
        }

        println!(
            "  Latency:  min {} | avg {} | max {}",
            Self::format_us(s.min).green(),
            Self::format_us(s.average).cyan(),
            Self::format_us(s.max).red()
        );

        let jitter_pct = Self::percentage(s.jitter_count, s.sample_count);
        let jitter = format!("{} ({:.2}%)", s.jitter_count, jitter_pct);
        let jitter = if jitter_pct > JITTER_WARN_PERCENT {
            jitter.red()
        } else {
            jitter.green()
        };
        println!("  Jitter:   {} of {} samples", jitter, s.sample_count);

        let percentiles: Vec<String> = PERCENTILES
            .iter()
            .map(|&(q, label)| {
                let ns = port.histogram.value_at_quantile(q);
                format!("{} {}", label, Self::format_us(Duration::from_nanos(ns)))
            })
            .collect();
        println!("  Spread:   {}\n", percentiles.join(" | "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_us() {
        assert_eq!(Reporter::format_us(Duration::from_nanos(1_500)), "1.500us");
        assert_eq!(Reporter::format_us(Duration::from_millis(2)), "2000.000us");
    }

    #[test]
    fn test_percentage() {
        assert_eq!(Reporter::percentage(0, 0), 0.0);
        assert_eq!(Reporter::percentage(1, 4), 25.0);
    }
}
