//! Length-prefixed reassembly.
//!
//! State machine:
//! - `WaitingForHeader`: need 4 bytes to learn the payload length
//! - `WaitingForPayload`: header parsed, need `remaining` payload bytes

use bytes::BytesMut;
use tracing::debug;

use crate::codec::{ByteOrder, FrameConfig, LENGTH_HEADER_SIZE};
use crate::erase::{erase, extend_erasing, SecretBytes};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitingForHeader,
    WaitingForPayload { remaining: usize },
}

/// Reassembles length-prefixed messages from arbitrary chunks.
///
/// All input accumulates in one buffer. Header bytes are zeroed as soon as
/// they are parsed; payload bytes leave the buffer as [`SecretBytes`] and
/// are zeroed when the message is dropped.
#[derive(Debug)]
pub struct LengthPrefixedDecoder {
    buf: BytesMut,
    state: State,
    byte_order: ByteOrder,
    max_payload_size: usize,
}

impl LengthPrefixedDecoder {
    pub fn new(config: &FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            state: State::WaitingForHeader,
            byte_order: config.byte_order,
            max_payload_size: config.payload_limit(),
        }
    }

    /// Feed one chunk and return every message now complete, in order.
    ///
    /// A header declaring zero bytes completes an empty message immediately.
    /// A header above the configured maximum is an error; the buffer is
    /// zeroed and the decoder returns to waiting for a header, but stream
    /// alignment is lost and the caller should stop reading.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SecretBytes>> {
        let mut messages = Vec::new();
        self.push_into(chunk, &mut messages)?;
        Ok(messages)
    }

    /// Like [`push`](Self::push), appending to `out`. On error `out` still
    /// holds the messages completed before the offending header.
    pub fn push_into(&mut self, chunk: &[u8], out: &mut Vec<SecretBytes>) -> Result<()> {
        extend_erasing(&mut self.buf, chunk);

        let before = out.len();
        let result = self.extract_all(out);

        if out.len() > before {
            debug!(
                messages = out.len() - before,
                buffered = self.buf.len(),
                "length-prefixed frames decoded"
            );
        }
        result
    }

    fn extract_all(&mut self, out: &mut Vec<SecretBytes>) -> Result<()> {
        while let Some(message) = self.try_extract_one()? {
            out.push(message);
        }
        Ok(())
    }

    fn try_extract_one(&mut self) -> Result<Option<SecretBytes>> {
        let remaining = match self.state {
            State::WaitingForHeader => {
                if self.buf.len() < LENGTH_HEADER_SIZE {
                    return Ok(None);
                }

                let mut header = self.buf.split_to(LENGTH_HEADER_SIZE);
                let mut raw = [0u8; LENGTH_HEADER_SIZE];
                raw.copy_from_slice(&header);
                let declared = self.byte_order.read_u32(raw) as usize;
                erase(&mut raw);
                erase(&mut header);

                if declared > self.max_payload_size {
                    self.reset();
                    return Err(FrameError::PayloadTooLarge {
                        size: declared,
                        max: self.max_payload_size,
                    });
                }
                declared
            }
            State::WaitingForPayload { remaining } => remaining,
        };

        if remaining == 0 {
            self.state = State::WaitingForHeader;
            return Ok(Some(SecretBytes::empty()));
        }

        if self.buf.len() < remaining {
            self.state = State::WaitingForPayload { remaining };
            return Ok(None);
        }

        let payload = self.buf.split_to(remaining);
        self.state = State::WaitingForHeader;
        Ok(Some(SecretBytes::new(payload)))
    }

    /// Declared length of the message being assembled, or 0 while waiting
    /// for a header.
    pub fn bytes_left(&self) -> usize {
        match self.state {
            State::WaitingForHeader => 0,
            State::WaitingForPayload { remaining } => remaining,
        }
    }

    /// Bytes held but not yet resolved into a message.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Zero and drop everything buffered.
    pub fn reset(&mut self) {
        erase(&mut self.buf);
        self.buf.clear();
        self.state = State::WaitingForHeader;
    }
}

#[cfg(test)]
mod tests {
    use bytes::BufMut;

    use super::*;
    use crate::codec::{encode_frame, Framing};

    fn wire(config: &FrameConfig, payloads: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for payload in payloads {
            encode_frame(Framing::LengthPrefixed, config, payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn decodes_single_message() {
        let cfg = FrameConfig::default();
        let mut decoder = LengthPrefixedDecoder::new(&cfg);
        let messages = decoder.push(&wire(&cfg, &[b"hello"])).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].as_bytes(), b"hello");
        assert_eq!(decoder.buffered(), 0);
        assert_eq!(decoder.bytes_left(), 0);
    }

    #[test]
    fn decodes_big_endian() {
        let cfg = FrameConfig {
            byte_order: ByteOrder::Big,
            ..FrameConfig::default()
        };
        let mut decoder = LengthPrefixedDecoder::new(&cfg);
        let messages = decoder.push(&[0, 0, 0, 3, b'a', b'b', b'c']).unwrap();
        assert_eq!(messages[0].as_bytes(), b"abc");
    }

    #[test]
    fn split_header_two_and_two() {
        let cfg = FrameConfig::default();
        let bytes = wire(&cfg, &[b"payload"]);
        let mut decoder = LengthPrefixedDecoder::new(&cfg);

        assert!(decoder.push(&bytes[..2]).unwrap().is_empty());
        assert_eq!(decoder.buffered(), 2);
        assert!(decoder.push(&bytes[2..4]).unwrap().is_empty());
        assert_eq!(decoder.bytes_left(), 7);
        assert_eq!(decoder.buffered(), 0);

        let messages = decoder.push(&bytes[4..]).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].as_bytes(), b"payload");
    }

    #[test]
    fn split_payload_yields_nothing_until_complete() {
        let cfg = FrameConfig::default();
        let bytes = wire(&cfg, &[b"0123456789"]);
        let mut decoder = LengthPrefixedDecoder::new(&cfg);

        assert!(decoder.push(&bytes[..6]).unwrap().is_empty());
        assert_eq!(decoder.bytes_left(), 10);
        assert!(decoder.push(&bytes[6..9]).unwrap().is_empty());
        assert!(decoder.push(&bytes[9..13]).unwrap().is_empty());

        let messages = decoder.push(&bytes[13..]).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].as_bytes(), b"0123456789");
    }

    #[test]
    fn zero_length_header_is_empty_message() {
        let cfg = FrameConfig::default();
        let mut decoder = LengthPrefixedDecoder::new(&cfg);

        let messages = decoder.push(&[0, 0, 0, 0]).unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_empty());
        assert_eq!(decoder.bytes_left(), 0);
    }

    #[test]
    fn zero_length_between_messages() {
        let cfg = FrameConfig::default();
        let mut decoder = LengthPrefixedDecoder::new(&cfg);
        let messages = decoder.push(&wire(&cfg, &[&b"a"[..], &b""[..], &b"bc"[..]])).unwrap();
        let got: Vec<&[u8]> = messages.iter().map(|m| m.as_bytes()).collect();
        assert_eq!(got, vec![&b"a"[..], &b""[..], &b"bc"[..]]);
    }

    #[test]
    fn several_messages_and_a_partial_one() {
        let cfg = FrameConfig::default();
        let mut bytes = wire(&cfg, &[&b"one"[..], &b"two"[..]]);
        bytes.extend_from_slice(&[5, 0, 0, 0, b't', b'h']);

        let mut decoder = LengthPrefixedDecoder::new(&cfg);
        let messages = decoder.push(&bytes).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(decoder.bytes_left(), 5);
        assert_eq!(decoder.buffered(), 2);

        let messages = decoder.push(b"ree").unwrap();
        assert_eq!(messages[0].as_bytes(), b"three");
    }

    #[test]
    fn oversized_header_rejected_and_buffer_cleared() {
        let cfg = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut decoder = LengthPrefixedDecoder::new(&cfg);
        let mut bytes = BytesMut::new();
        bytes.put_u32_le(1024);
        bytes.put_slice(b"junk");

        let err = decoder.push(&bytes).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge { size: 1024, max: 16 }
        ));
        assert_eq!(decoder.buffered(), 0);
        assert_eq!(decoder.bytes_left(), 0);
    }

    #[test]
    fn oversized_header_keeps_messages_completed_before_it() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut decoder = LengthPrefixedDecoder::new(&cfg);
        let mut out = Vec::new();

        let err = decoder
            .push_into(&[2, 0, 0, 0, b'o', b'k', 100, 0, 0, 0], &mut out)
            .unwrap_err();

        assert!(matches!(
            err,
            FrameError::PayloadTooLarge { size: 100, max: 4 }
        ));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_bytes(), b"ok");
        assert_eq!(decoder.buffered(), 0);
    }

    /// View `len` bytes of an allocation the decoder still owns.
    ///
    /// # Safety
    /// `ptr..ptr + len` must lie inside a live, previously written
    /// allocation.
    unsafe fn read_back<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
        std::slice::from_raw_parts(ptr, len)
    }

    #[test]
    fn parsed_header_is_zeroed_in_place() {
        let cfg = FrameConfig::default();
        let mut decoder = LengthPrefixedDecoder::new(&cfg);
        let base = decoder.buf.as_ptr();

        let messages = decoder.push(&[6, 0, 0, 0, b's', b'e', b'c', b'r', b'e', b't']).unwrap();

        assert_eq!(messages[0].as_bytes(), b"secret");
        // The message still shares the allocation the header was parsed from.
        let header = unsafe { read_back(base, LENGTH_HEADER_SIZE) };
        assert_eq!(header, &[0u8; LENGTH_HEADER_SIZE]);
    }

    #[test]
    fn oversize_path_zeroes_header_and_buffered_bytes() {
        let cfg = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut decoder = LengthPrefixedDecoder::new(&cfg);
        let base = decoder.buf.as_ptr();

        decoder.push(&[200, 0, 0, 0, b'p', b'w']).unwrap_err();

        assert_eq!(decoder.buffered(), 0);
        let region = unsafe { read_back(base, 6) };
        assert_eq!(region, &[0u8; 6]);
    }

    #[test]
    fn dropped_message_zeroes_its_region() {
        let cfg = FrameConfig::default();
        let mut decoder = LengthPrefixedDecoder::new(&cfg);
        let base = decoder.buf.as_ptr();

        let messages = decoder.push(&[3, 0, 0, 0, b'k', b'e', b'y', 1, 0]).unwrap();
        assert_eq!(messages[0].as_bytes(), b"key");
        drop(messages);

        // The partial next header keeps the allocation alive.
        assert_eq!(decoder.buffered(), 2);
        let region = unsafe { read_back(base, 7) };
        assert_eq!(region, &[0u8; 7]);
    }
}
