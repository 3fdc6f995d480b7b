use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LatencyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown port: {0}")]
    UnknownPort(u16),
}

pub type Result<T> = std::result::Result<T, LatencyError>;
