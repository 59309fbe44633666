//! `tokio_util::codec` integration.

use std::collections::VecDeque;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, FrameConfig, Framing};
use crate::decoder::FrameDecoder;
use crate::erase::{erase, SecretBytes};
use crate::error::{FrameError, Result};

/// Codec for `FramedRead`/`FramedWrite` over either framing.
///
/// Incoming bytes are moved out of the read buffer into the reassembly
/// state machine and zeroed there.
#[derive(Debug)]
pub struct PipeCodec {
    framing: Framing,
    config: FrameConfig,
    decoder: FrameDecoder,
    ready: VecDeque<SecretBytes>,
    failed: Option<FrameError>,
}

impl PipeCodec {
    pub fn new(framing: Framing) -> Self {
        Self::with_config(framing, FrameConfig::default())
    }

    pub fn with_config(framing: Framing, config: FrameConfig) -> Self {
        Self {
            framing,
            decoder: FrameDecoder::new(framing, &config),
            config,
            ready: VecDeque::new(),
            failed: None,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }
}

impl Decoder for PipeCodec {
    type Item = SecretBytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<SecretBytes>> {
        if self.ready.is_empty() && self.failed.is_none() && !src.is_empty() {
            let mut chunk = src.split();
            let mut decoded = Vec::new();
            let result = self.decoder.push_into(&chunk, &mut decoded);
            erase(&mut chunk);
            self.ready.extend(decoded);
            self.failed = result.err();
        }
        // Frames completed ahead of a violation are yielded before it.
        match self.ready.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None => match self.failed.take() {
                Some(err) => Err(err),
                None => Ok(None),
            },
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<SecretBytes>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if self.decoder.has_partial() => {
                self.decoder.reset();
                Err(FrameError::ConnectionClosed)
            }
            None => Ok(None),
        }
    }
}

impl Encoder<&[u8]> for PipeCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
        encode_frame(self.framing, &self.config, payload, dst)
    }
}
