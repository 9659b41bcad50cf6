use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::flags;

/// Part header: magic (2) + length (4) + flags (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "BW" (0x42 0x57).
pub const MAGIC: [u8; 2] = [0x42, 0x57];

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// One wire frame of a message unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Whether another part of the same unit follows.
    pub more: bool,
    /// The part payload.
    pub payload: Bytes,
}

impl Part {
    /// Create a new part.
    pub fn new(more: bool, payload: impl Into<Bytes>) -> Self {
        Self {
            more,
            payload: payload.into(),
        }
    }
}

/// Encode a part into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬──────────┬─────────────────┐
/// │ Magic (2B)   │ Length    │ Flags    │ Payload          │
/// │ 0x42 0x57    │ (4B LE)  │ (2B LE)  │ (Length bytes)   │
/// │ "BW"         │          │          │                  │
/// └──────────────┴───────────┴──────────┴─────────────────┘
/// ```
pub fn encode_part(more: bool, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_u16_le(flags::for_part(more));
    dst.put_slice(payload);
    Ok(())
}

/// Decode a part from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete part yet.
/// On success, consumes the part bytes from the buffer.
pub fn decode_part(src: &mut BytesMut, max_payload: usize) -> Result<Option<Part>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    let flag_word = u16::from_le_bytes([src[6], src[7]]);

    if let Some(unknown) = flags::unknown_bits(flag_word) {
        return Err(FrameError::UnknownFlags(unknown));
    }

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Part {
        more: flags::has_more(flag_word),
        payload,
    }))
}

/// Configuration for the part codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size of a single part in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
