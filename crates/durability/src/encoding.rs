//! WAL frame encoding/decoding with CRC32 checksums
//!
//! ```text
//! +----------------+----------------+------------------------+
//! | len: u32 LE    | crc32: u32 LE  | payload: bincode bytes |
//! +----------------+----------------+------------------------+
//! ```
//!
//! The checksum covers the payload only. A frame whose header or payload
//! is cut short is reported as incomplete, which replay treats as a torn
//! tail left by a crash mid-write.

use crate::wal::WalRecord;
use annolog_core::error::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};

/// Bytes before the payload
pub const FRAME_HEADER_LEN: usize = 8;

/// Upper bound on a single payload; anything larger is treated as corruption
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Outcome of decoding one frame
#[derive(Debug, PartialEq)]
pub enum FrameRead {
    /// A valid record and the total frame length in bytes
    Record {
        /// Decoded record
        record: WalRecord,
        /// Header plus payload length
        frame_len: usize,
    },
    /// Buffer ends before the frame does
    Incomplete,
    /// Frame is present but fails validation
    Corrupt(String),
}

/// Encode a record as a complete frame
pub fn encode_record(record: &WalRecord) -> Result<Vec<u8>> {
    let payload = bincode::serialize(record).map_err(|e| Error::Serialization(e.to_string()))?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(Error::Serialization(format!(
            "WAL record of {} bytes exceeds frame limit",
            payload.len()
        )));
    }

    let mut frame = vec![0u8; FRAME_HEADER_LEN + payload.len()];
    LittleEndian::write_u32(&mut frame[0..4], payload.len() as u32);
    LittleEndian::write_u32(&mut frame[4..8], crc32fast::hash(&payload));
    frame[FRAME_HEADER_LEN..].copy_from_slice(&payload);
    Ok(frame)
}

/// Decode the frame at the start of `buf`
pub fn decode_record(buf: &[u8]) -> FrameRead {
    if buf.len() < FRAME_HEADER_LEN {
        return FrameRead::Incomplete;
    }
    let len = LittleEndian::read_u32(&buf[0..4]) as usize;
    let expected_crc = LittleEndian::read_u32(&buf[4..8]);
    if len > MAX_FRAME_LEN {
        return FrameRead::Corrupt(format!("frame length {} exceeds limit", len));
    }
    if buf.len() < FRAME_HEADER_LEN + len {
        return FrameRead::Incomplete;
    }

    let payload = &buf[FRAME_HEADER_LEN..FRAME_HEADER_LEN + len];
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return FrameRead::Corrupt(format!(
            "checksum mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        ));
    }

    match bincode::deserialize::<WalRecord>(payload) {
        Ok(record) => FrameRead::Record {
            record,
            frame_len: FRAME_HEADER_LEN + len,
        },
        Err(e) => FrameRead::Corrupt(format!("undecodable payload: {}", e)),
    }
}
