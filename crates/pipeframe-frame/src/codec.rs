use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

/// Message terminator for NUL-delimited framing.
pub const SENTINEL: u8 = 0x00;

/// Length prefix: one unsigned 32-bit integer.
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Byte order of the length prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    #[serde(rename = "be")]
    Big,
    #[default]
    #[serde(rename = "le")]
    Little,
}

impl ByteOrder {
    /// Decode a length prefix.
    pub fn read_u32(self, header: [u8; LENGTH_HEADER_SIZE]) -> u32 {
        match self {
            ByteOrder::Big => u32::from_be_bytes(header),
            ByteOrder::Little => u32::from_le_bytes(header),
        }
    }

    /// Append a length prefix to `dst`.
    pub fn put_u32(self, dst: &mut BytesMut, value: u32) {
        match self {
            ByteOrder::Big => dst.put_u32(value),
            ByteOrder::Little => dst.put_u32_le(value),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ByteOrder::Big => "be",
            ByteOrder::Little => "le",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ByteOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "be" | "big" => Ok(ByteOrder::Big),
            "le" | "little" => Ok(ByteOrder::Little),
            other => Err(format!("unknown byte order '{other}' (expected be or le)")),
        }
    }
}

/// Message boundary strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Each message is followed by a single `0x00` byte.
    Nul,
    /// Each message is preceded by a 4-byte length.
    LengthPrefixed,
}

impl Framing {
    pub fn as_str(self) -> &'static str {
        match self {
            Framing::Nul => "nul",
            Framing::LengthPrefixed => "length",
        }
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for framing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Length prefix byte order. Default: little-endian.
    pub byte_order: ByteOrder,
    /// Maximum payload size in bytes, for both directions. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::default(),
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl FrameConfig {
    /// Effective limit: the configured maximum, capped to what a length
    /// prefix can express.
    pub fn payload_limit(&self) -> usize {
        self.max_payload_size.min(u32::MAX as usize)
    }
}

/// Encode one message into `dst` using the given framing.
///
/// Wire formats:
/// ```text
/// Nul:            │ Payload (N bytes) │ 0x00 │
/// LengthPrefixed: │ N (4B, BE or LE)  │ Payload (N bytes) │
/// ```
///
/// NUL-delimited payloads must not contain `0x00`. This is not checked; an
/// embedded NUL splits the message in two on the receiving side.
pub fn encode_frame(
    framing: Framing,
    config: &FrameConfig,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let max = match framing {
        Framing::Nul => config.max_payload_size,
        Framing::LengthPrefixed => config.payload_limit(),
    };
    if payload.len() > max {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max,
        });
    }

    match framing {
        Framing::Nul => {
            dst.reserve(payload.len() + 1);
            dst.put_slice(payload);
            dst.put_u8(SENTINEL);
        }
        Framing::LengthPrefixed => {
            dst.reserve(LENGTH_HEADER_SIZE + payload.len());
            config.byte_order.put_u32(dst, payload.len() as u32);
            dst.put_slice(payload);
        }
    }
    Ok(())
}
