//! Probe packet wire format

pub mod error;
pub mod probe;

pub use error::{ProtocolError, Result as ProtocolResult};
pub use probe::{
    ProbeRecord, SequenceNumber, ETHER_CRC_LEN, MIN_PKT_SIZE, PROBE_HEADER_SIZE, PROBE_MARKER,
    PROBE_PAYLOAD_SIZE, TARGET_FRAME_SIZE,
};
