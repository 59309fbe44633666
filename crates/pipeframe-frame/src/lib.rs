//! Message framing for raw byte pipes.
//!
//! Turns an ordered stream of arbitrarily sized byte chunks into whole
//! messages, and back. Two wire formats are supported:
//! - NUL-delimited: `<message> 0x00 <message> 0x00 ...`
//! - Length-prefixed: a 4-byte unsigned length (big- or little-endian)
//!   followed by exactly that many payload bytes
//!
//! Consumed bytes are zeroed as soon as they are parsed, and every message
//! buffer is zeroed when it is dropped.

pub mod codec;
pub mod decoder;
pub mod erase;
pub mod error;
pub mod length;
pub mod reader;
pub mod sentinel;
pub mod writer;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{
    encode_frame, ByteOrder, FrameConfig, Framing, DEFAULT_MAX_PAYLOAD, LENGTH_HEADER_SIZE,
    SENTINEL,
};
pub use decoder::FrameDecoder;
pub use erase::{erase, EraseGuard, SecretBytes};
pub use error::{FrameError, Result};
pub use length::LengthPrefixedDecoder;
pub use reader::FrameReader;
pub use sentinel::NulDecoder;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use tokio_codec::PipeCodec;
