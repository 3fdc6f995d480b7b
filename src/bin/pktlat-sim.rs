use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use pktlat::latency::init_logging_with_config;
use pktlat::protocol::PROBE_PAYLOAD_SIZE;
use pktlat::sim::{run_simulation, Reporter, SimConfig};
use tracing::{error, info};

fn main() {
    // Parse CLI arguments
    let config = SimConfig::parse();

    init_logging_with_config(&config.log_level, config.is_json_format());

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Simulation failed");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: SimConfig) -> Result<()> {
    println!("{}", "pktlat latency probe simulator".bold());
    println!(
        "Ports: {} | Simulated: {:?} | Probe: {} bytes every {}ms | DUT delay: {}us + {}us\n",
        config.ports,
        config.duration(),
        PROBE_PAYLOAD_SIZE,
        config.rate_ms,
        config.base_delay_us,
        config.delay_variation_us
    );

    info!(
        ports = config.ports,
        duration_ms = config.duration_ms,
        seed = config.seed,
        "Running simulation"
    );

    let result = run_simulation(&config).context("latency simulation failed")?;
    Reporter::print_results(&result);
    Ok(())
}
