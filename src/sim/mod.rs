//! Loopback simulation of the transmit path, device under test and receive path

pub mod config;
pub mod dut;
pub mod error;
pub mod reporter;
pub mod runner;

pub use config::SimConfig;
pub use dut::DelayLine;
pub use error::{Result, SimError};
pub use reporter::Reporter;
pub use runner::{run_simulation, PortResult, SimulationResult};
