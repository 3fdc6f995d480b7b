//! Probe codec
//!
//! A probe payload starts with a fixed 16-byte header, all fields big-endian:
//!
//! | offset | size | field                       |
//! |-------:|-----:|-----------------------------|
//! | 0      | 4    | marker [`PROBE_MARKER`]     |
//! | 4      | 4    | sequence number             |
//! | 8      | 8    | send timestamp (raw ticks)  |
//!
//! The rest of the payload, up to [`PROBE_PAYLOAD_SIZE`], is filler where the
//! byte at offset `i` is `i as u8`. Sender and analyzer must agree on this layout.

use crate::protocol::error::{ProtocolError, Result};
use tracing::trace;

/// Minimum Ethernet frame size without the frame check sequence
pub const MIN_PKT_SIZE: usize = 60;

/// Ethernet frame check sequence length
pub const ETHER_CRC_LEN: usize = 4;

/// On-wire frame size a probe is padded to
pub const TARGET_FRAME_SIZE: usize = 128;

/// Total probe payload size (124 bytes)
pub const PROBE_PAYLOAD_SIZE: usize =
    MIN_PKT_SIZE + (TARGET_FRAME_SIZE - (MIN_PKT_SIZE + ETHER_CRC_LEN));

/// Marker identifying probe packets ("LATP")
pub const PROBE_MARKER: u32 = 0x4C41_5450;

/// Bytes occupied by marker, sequence number and timestamp
pub const PROBE_HEADER_SIZE: usize = 16;

const MARKER_BYTES: [u8; 4] = PROBE_MARKER.to_be_bytes();
const SEQUENCE_OFFSET: usize = 4;
const TIMESTAMP_OFFSET: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SequenceNumber(pub u32);

impl SequenceNumber {
    /// Returns this sequence number and advances `self`, wrapping at `u32::MAX`.
    pub fn post_increment(&mut self) -> Self {
        let current = *self;
        self.0 = self.0.wrapping_add(1);
        current
    }

    /// Signed distance from `self` to `other`, wrap-aware.
    pub fn distance_to(self, other: SequenceNumber) -> i32 {
        other.0.wrapping_sub(self.0) as i32
    }
}

/// Sequence number and send timestamp carried by one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRecord {
    pub sequence: SequenceNumber,
    pub send_timestamp: u64,
}

impl ProbeRecord {
    pub fn new(sequence: SequenceNumber, send_timestamp: u64) -> Self {
        Self {
            sequence,
            send_timestamp,
        }
    }

    pub fn encode(&self) -> [u8; PROBE_PAYLOAD_SIZE] {
        let mut buf = [0u8; PROBE_PAYLOAD_SIZE];
        self.write_header(&mut buf);
        fill(&mut buf);
        buf
    }

    /// Encodes into the front of `buf`, returning the number of bytes written.
    pub fn encode_into(&self, buf: &mut [u8]) -> Result<usize> {
        let actual = buf.len();
        let Some(payload) = buf.get_mut(..PROBE_PAYLOAD_SIZE) else {
            return Err(ProtocolError::BufferTooSmall {
                expected: PROBE_PAYLOAD_SIZE,
                actual,
            });
        };
        self.write_header(payload);
        fill(payload);
        Ok(PROBE_PAYLOAD_SIZE)
    }

    /// Returns `None` for anything that is not a probe, including short payloads.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if !Self::is_probe(bytes) {
            return None;
        }

        let sequence = bytes
            .get(SEQUENCE_OFFSET..TIMESTAMP_OFFSET)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_be_bytes)?;
        let send_timestamp = bytes
            .get(TIMESTAMP_OFFSET..PROBE_HEADER_SIZE)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_be_bytes)?;

        trace!(sequence, send_timestamp, "Probe decoded");

        Some(Self {
            sequence: SequenceNumber(sequence),
            send_timestamp,
        })
    }

    /// Length and marker check only.
    #[inline]
    pub fn is_probe(bytes: &[u8]) -> bool {
        bytes.len() >= PROBE_HEADER_SIZE && bytes[..SEQUENCE_OFFSET] == MARKER_BYTES
    }

    fn write_header(&self, buf: &mut [u8]) {
        buf[..SEQUENCE_OFFSET].copy_from_slice(&MARKER_BYTES);
        buf[SEQUENCE_OFFSET..TIMESTAMP_OFFSET].copy_from_slice(&self.sequence.0.to_be_bytes());
        buf[TIMESTAMP_OFFSET..PROBE_HEADER_SIZE]
            .copy_from_slice(&self.send_timestamp.to_be_bytes());
    }
}

fn fill(payload: &mut [u8]) {
    for (i, byte) in payload.iter_mut().enumerate().skip(PROBE_HEADER_SIZE) {
        *byte = i as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_size() {
        assert_eq!(PROBE_PAYLOAD_SIZE, 124);
        assert!(PROBE_PAYLOAD_SIZE >= MIN_PKT_SIZE);
        assert_eq!(PROBE_PAYLOAD_SIZE + ETHER_CRC_LEN, TARGET_FRAME_SIZE);
    }

    #[test]
    fn test_probe_encode_decode() {
        let original = ProbeRecord::new(SequenceNumber(12345), 987_654_321);
        let encoded = original.encode();
        assert_eq!(ProbeRecord::decode(&encoded), Some(original));
    }

    #[test]
    fn test_wire_layout() {
        let encoded = ProbeRecord::new(SequenceNumber(0x0102_0304), 0x1122_3344_5566_7788).encode();
        assert_eq!(&encoded[..4], b"LATP");
        assert_eq!(&encoded[4..8], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(
            &encoded[8..16],
            &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]
        );
        assert_eq!(encoded[16], 16);
        assert_eq!(encoded[123], 123);
    }

    #[test]
    fn test_filler_is_stable() {
        let a = ProbeRecord::new(SequenceNumber(1), 10).encode();
        let b = ProbeRecord::new(SequenceNumber(2), 20).encode();
        assert_eq!(a[PROBE_HEADER_SIZE..], b[PROBE_HEADER_SIZE..]);
    }

    #[test]
    fn test_encode_into_larger_buffer() {
        let record = ProbeRecord::new(SequenceNumber(7), 42);
        let mut buf = [0xFFu8; 1500];
        assert_eq!(record.encode_into(&mut buf), Ok(PROBE_PAYLOAD_SIZE));
        assert_eq!(ProbeRecord::decode(&buf), Some(record));
        assert_eq!(buf[PROBE_PAYLOAD_SIZE], 0xFF);
    }

    #[test]
    fn test_encode_into_small_buffer() {
        let record = ProbeRecord::new(SequenceNumber(7), 42);
        let mut buf = [0u8; 64];
        assert_eq!(
            record.encode_into(&mut buf),
            Err(ProtocolError::BufferTooSmall {
                expected: PROBE_PAYLOAD_SIZE,
                actual: 64
            })
        );
    }

    #[test]
    fn test_decode_rejects_short_and_foreign() {
        assert_eq!(ProbeRecord::decode(&[]), None);
        let encoded = ProbeRecord::new(SequenceNumber(1), 1).encode();
        assert_eq!(ProbeRecord::decode(&encoded[..PROBE_HEADER_SIZE - 1]), None);
        assert!(ProbeRecord::decode(&encoded[..PROBE_HEADER_SIZE]).is_some());

        let mut foreign = encoded;
        foreign[0] ^= 0x01;
        assert_eq!(ProbeRecord::decode(&foreign), None);
        assert_eq!(ProbeRecord::decode(&[0u8; 1514]), None);
    }

    #[test]
    fn test_sequence_wraps() {
        let mut seq = SequenceNumber(u32::MAX);
        assert_eq!(seq.post_increment(), SequenceNumber(u32::MAX));
        assert_eq!(seq, SequenceNumber(0));
        assert_eq!(SequenceNumber(u32::MAX).distance_to(SequenceNumber(1)), 2);
        assert_eq!(SequenceNumber(5).distance_to(SequenceNumber(3)), -2);
    }
}
