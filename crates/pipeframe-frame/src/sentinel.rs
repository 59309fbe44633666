//! NUL-delimited reassembly.

use bytes::BytesMut;
use tracing::debug;

use crate::codec::{FrameConfig, DEFAULT_MAX_PAYLOAD, SENTINEL};
use crate::erase::{erase, SecretBytes};
use crate::error::{FrameError, Result};

/// Reassembles NUL-terminated messages from arbitrary chunks.
///
/// Bytes seen since the last terminator are kept as separate fragments and
/// only joined once the terminator arrives. Joined fragments are zeroed.
#[derive(Debug)]
pub struct NulDecoder {
    pending: Vec<BytesMut>,
    pending_len: usize,
    max_payload_size: usize,
}

impl NulDecoder {
    pub fn new() -> Self {
        Self::with_max_payload(DEFAULT_MAX_PAYLOAD)
    }

    pub fn with_config(config: &FrameConfig) -> Self {
        Self::with_max_payload(config.max_payload_size)
    }

    pub fn with_max_payload(max_payload_size: usize) -> Self {
        Self {
            pending: Vec::new(),
            pending_len: 0,
            max_payload_size,
        }
    }

    /// Feed one chunk and return every message it completes, in order.
    ///
    /// A terminator at the start of a chunk completes whatever was pending,
    /// which may be an empty message.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SecretBytes>> {
        let mut messages = Vec::new();
        self.push_into(chunk, &mut messages)?;
        Ok(messages)
    }

    /// Like [`push`](Self::push), appending to `out`. On error `out` still
    /// holds the messages completed before the oversized one.
    pub fn push_into(&mut self, chunk: &[u8], out: &mut Vec<SecretBytes>) -> Result<()> {
        let before = out.len();
        let result = self.split_chunk(chunk, out);

        if out.len() > before {
            debug!(
                messages = out.len() - before,
                pending = self.pending_len,
                "nul frames decoded"
            );
        }
        result
    }

    fn split_chunk(&mut self, chunk: &[u8], out: &mut Vec<SecretBytes>) -> Result<()> {
        let mut start = 0usize;

        while let Some(offset) = chunk[start..].iter().position(|b| *b == SENTINEL) {
            let end = start + offset;
            self.check_size(end - start)?;
            let message = if self.pending.is_empty() {
                SecretBytes::from(&chunk[start..end])
            } else {
                self.join_pending(&chunk[start..end])
            };
            out.push(message);
            start = end + 1;
        }

        let rest = &chunk[start..];
        if !rest.is_empty() {
            self.check_size(rest.len())?;
            self.pending.push(BytesMut::from(rest));
            self.pending_len += rest.len();
        }
        Ok(())
    }

    /// Bytes held for the next message.
    pub fn buffered(&self) -> usize {
        self.pending_len
    }

    /// Number of fragments held for the next message.
    pub fn fragments(&self) -> usize {
        self.pending.len()
    }

    /// Zero and drop everything pending.
    pub fn reset(&mut self) {
        for fragment in &mut self.pending {
            erase(fragment);
        }
        self.pending.clear();
        self.pending_len = 0;
    }

    fn check_size(&mut self, incoming: usize) -> Result<()> {
        let size = self.pending_len.saturating_add(incoming);
        if size > self.max_payload_size {
            self.reset();
            return Err(FrameError::PayloadTooLarge {
                size,
                max: self.max_payload_size,
            });
        }
        Ok(())
    }

    fn join_pending(&mut self, tail: &[u8]) -> SecretBytes {
        let mut joined = BytesMut::with_capacity(self.pending_len + tail.len());
        for fragment in &self.pending {
            joined.extend_from_slice(fragment);
        }
        joined.extend_from_slice(tail);
        self.reset();
        SecretBytes::new(joined)
    }
}

impl Default for NulDecoder {
    fn default() -> Self {
        Self::new()
    }
}
