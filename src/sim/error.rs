use crate::latency::LatencyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Latency port error: {0}")]
    Latency(#[from] LatencyError),

    #[error("Report error: {0}")]
    Report(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
