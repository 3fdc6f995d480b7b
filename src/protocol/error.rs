use thiserror::Error;

/// Protocol-level errors for probe encoding
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Probe buffer too small: need {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
