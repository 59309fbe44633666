use crate::codec::{FrameConfig, Framing};
use crate::erase::SecretBytes;
use crate::error::Result;
use crate::length::LengthPrefixedDecoder;
use crate::sentinel::NulDecoder;

/// Either reassembly state machine, selected by [`Framing`].
#[derive(Debug)]
pub enum FrameDecoder {
    Nul(NulDecoder),
    LengthPrefixed(LengthPrefixedDecoder),
}

impl FrameDecoder {
    pub fn new(framing: Framing, config: &FrameConfig) -> Self {
        match framing {
            Framing::Nul => FrameDecoder::Nul(NulDecoder::with_config(config)),
            Framing::LengthPrefixed => {
                FrameDecoder::LengthPrefixed(LengthPrefixedDecoder::new(config))
            }
        }
    }

    pub fn framing(&self) -> Framing {
        match self {
            FrameDecoder::Nul(_) => Framing::Nul,
            FrameDecoder::LengthPrefixed(_) => Framing::LengthPrefixed,
        }
    }

    /// Feed one chunk and return every message it completes, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SecretBytes>> {
        match self {
            FrameDecoder::Nul(decoder) => decoder.push(chunk),
            FrameDecoder::LengthPrefixed(decoder) => decoder.push(chunk),
        }
    }

    /// Like [`push`](Self::push), appending to `out`. On error `out` still
    /// holds every message completed before the violation.
    pub fn push_into(&mut self, chunk: &[u8], out: &mut Vec<SecretBytes>) -> Result<()> {
        match self {
            FrameDecoder::Nul(decoder) => decoder.push_into(chunk, out),
            FrameDecoder::LengthPrefixed(decoder) => decoder.push_into(chunk, out),
        }
    }

    /// Bytes held but not yet resolved into a message.
    pub fn buffered(&self) -> usize {
        match self {
            FrameDecoder::Nul(decoder) => decoder.buffered(),
            FrameDecoder::LengthPrefixed(decoder) => decoder.buffered(),
        }
    }

    /// True when a message has been started but not finished.
    pub fn has_partial(&self) -> bool {
        match self {
            FrameDecoder::Nul(decoder) => decoder.buffered() > 0,
            FrameDecoder::LengthPrefixed(decoder) => {
                decoder.buffered() > 0 || decoder.bytes_left() > 0
            }
        }
    }

    /// Zero and drop everything buffered.
    pub fn reset(&mut self) {
        match self {
            FrameDecoder::Nul(decoder) => decoder.reset(),
            FrameDecoder::LengthPrefixed(decoder) => decoder.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::codec::{encode_frame, ByteOrder};
    use crate::error::FrameError;

    fn decode_in_chunks(
        framing: Framing,
        config: &FrameConfig,
        wire: &[u8],
        size: usize,
    ) -> Vec<Vec<u8>> {
        let mut decoder = FrameDecoder::new(framing, config);
        let mut out = Vec::new();
        for chunk in wire.chunks(size) {
            for message in decoder.push(chunk).unwrap() {
                out.push(message.as_bytes().to_vec());
            }
        }
        assert!(!decoder.has_partial());
        out
    }

    #[test]
    fn chunk_size_does_not_change_result() {
        let payloads: [&[u8]; 5] = [
            b"{\"id\":1}",
            b"",
            b"x",
            b"longer message body",
            b"\xe2\x9c\x93",
        ];

        for framing in [Framing::Nul, Framing::LengthPrefixed] {
            for byte_order in [ByteOrder::Little, ByteOrder::Big] {
                let config = FrameConfig {
                    byte_order,
                    ..FrameConfig::default()
                };
                let mut wire = BytesMut::new();
                for payload in payloads {
                    encode_frame(framing, &config, payload, &mut wire).unwrap();
                }

                let whole = decode_in_chunks(framing, &config, &wire, wire.len());
                assert_eq!(whole.len(), payloads.len());
                for size in 1..=wire.len() {
                    assert_eq!(
                        decode_in_chunks(framing, &config, &wire, size),
                        whole,
                        "framing={framing} order={byte_order} chunk={size}"
                    );
                }
            }
        }
    }

    #[test]
    fn violation_keeps_earlier_messages_for_both_framings() {
        let config = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let cases: [(Framing, &[u8]); 2] = [
            (Framing::Nul, b"ok\0toolong\0"),
            (Framing::LengthPrefixed, &[2, 0, 0, 0, b'o', b'k', 100, 0, 0, 0]),
        ];

        for (framing, wire) in cases {
            let mut decoder = FrameDecoder::new(framing, &config);
            let mut out = Vec::new();

            let err = decoder.push_into(wire, &mut out).unwrap_err();

            assert!(matches!(err, FrameError::PayloadTooLarge { .. }), "{framing}");
            assert_eq!(out.len(), 1, "{framing}");
            assert_eq!(out[0].as_bytes(), b"ok");
            assert!(!decoder.has_partial());
        }
    }

    #[test]
    fn reports_framing_and_partial_state() {
        let mut decoder = FrameDecoder::new(Framing::LengthPrefixed, &FrameConfig::default());
        assert_eq!(decoder.framing(), Framing::LengthPrefixed);
        assert!(!decoder.has_partial());

        decoder.push(&[3, 0, 0, 0, b'a']).unwrap();
        assert!(decoder.has_partial());

        decoder.reset();
        assert!(!decoder.has_partial());
        assert_eq!(decoder.buffered(), 0);
    }
}
