use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use crate::codec::{FrameConfig, Framing};
use crate::decoder::FrameDecoder;
use crate::erase::{erase, SecretBytes};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Pull-style counterpart of the event-driven transport: each call blocks
/// until one whole message is available. Messages completed by the same
/// read are queued and returned by subsequent calls in order.
pub struct FrameReader<T> {
    inner: T,
    decoder: FrameDecoder,
    ready: VecDeque<SecretBytes>,
    failed: Option<FrameError>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T, framing: Framing) -> Self {
        Self::with_config(inner, framing, &FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, framing: Framing, config: &FrameConfig) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::new(framing, config),
            ready: VecDeque::new(),
            failed: None,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    /// Frames completed before a framing error are returned first; the
    /// error follows once they are drained.
    pub fn read_frame(&mut self) -> Result<SecretBytes> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            if let Some(frame) = self.ready.pop_front() {
                erase(&mut chunk);
                return Ok(frame);
            }
            if let Some(err) = self.failed.take() {
                return Err(err);
            }

            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            let mut decoded = Vec::new();
            let result = self.decoder.push_into(&chunk[..read], &mut decoded);
            erase(&mut chunk[..read]);
            self.ready.extend(decoded);
            if let Err(err) = result {
                self.failed = Some(err);
            }
        }
    }

    /// Bytes of an unfinished frame currently held.
    pub fn buffered(&self) -> usize {
        self.decoder.buffered()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    ///
    /// Buffered partial data and queued frames are erased.
    pub fn into_inner(mut self) -> T {
        self.decoder.reset();
        self.ready.clear();
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{encode_frame, ByteOrder};
    use crate::writer::FrameWriter;

    fn wire(framing: Framing, config: &FrameConfig, payloads: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for payload in payloads {
            encode_frame(framing, config, payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_multiple_nul_frames() {
        let cfg = FrameConfig::default();
        let bytes = wire(Framing::Nul, &cfg, &[&b"one"[..], &b"two"[..], &b""[..]]);
        let mut reader = FrameReader::new(Cursor::new(bytes), Framing::Nul);

        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"one");
        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"two");
        assert!(reader.read_frame().unwrap().is_empty());
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn read_length_prefixed_big_endian() {
        let cfg = FrameConfig {
            byte_order: ByteOrder::Big,
            ..FrameConfig::default()
        };
        let bytes = wire(Framing::LengthPrefixed, &cfg, &[&b"hello"[..]]);
        let mut reader =
            FrameReader::with_config(Cursor::new(bytes), Framing::LengthPrefixed, &cfg);

        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"hello");
    }

    #[test]
    fn read_frame_with_large_payload() {
        let payload = vec![0xAB; 64 * 1024];
        let cfg = FrameConfig::default();
        let bytes = wire(Framing::LengthPrefixed, &cfg, &[payload.as_slice()]);

        let mut reader = FrameReader::new(Cursor::new(bytes), Framing::LengthPrefixed);
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.as_bytes(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let cfg = FrameConfig::default();
        let byte_reader = ByteByByteReader {
            bytes: wire(Framing::LengthPrefixed, &cfg, &[&b"slow"[..]]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader, Framing::LengthPrefixed);

        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"slow");
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut reader = FrameReader::new(
            Cursor::new(vec![16, 0, 0, 0, b'p', b'a', b'r', b't']),
            Framing::LengthPrefixed,
        );
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.buffered(), 4);
    }

    #[test]
    fn oversized_frame_in_stream() {
        let cfg = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(
            Cursor::new(vec![0, 4, 0, 0]),
            Framing::LengthPrefixed,
            &cfg,
        );
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 1024, max: 16 }));
    }

    #[test]
    fn frames_before_oversized_one_are_returned_first() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(
            Cursor::new(b"ok\0toolong\0".to_vec()),
            Framing::Nul,
            &cfg,
        );

        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"ok");
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::PayloadTooLarge { size: 7, max: 4 }
        ));
    }

    #[test]
    fn read_chunk_is_zeroed_between_reads() {
        let mut source = InspectingReader::new(vec![b"sec".to_vec(), b"ret\0".to_vec()]);
        let mut reader = FrameReader::new(&mut source, Framing::Nul);

        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"secret");
        assert_eq!(source.leftovers, vec![vec![0u8; 3]]);
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            bytes: b"ok\0".to_vec(),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader, Framing::Nul);
        assert_eq!(framed.read_frame().unwrap().as_bytes(), b"ok");
    }

    #[test]
    fn read_would_block_propagates_io_error() {
        let mut framed = FrameReader::new(WouldBlockReader, Framing::Nul);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = FrameWriter::new(left, Framing::Nul);
        let mut reader = FrameReader::new(right, Framing::Nul);

        writer.send(b"{\"method\":\"ping\"}").unwrap();
        writer.send(b"{\"method\":\"pong\"}").unwrap();

        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"{\"method\":\"ping\"}");
        assert_eq!(reader.read_frame().unwrap().as_bytes(), b"{\"method\":\"pong\"}");
    }

    #[test]
    #[cfg(unix)]
    fn concurrent_reader_writer_threads() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = FrameWriter::new(left, Framing::LengthPrefixed);
        let mut reader = FrameReader::new(right, Framing::LengthPrefixed);

        let reader_thread = std::thread::spawn(move || {
            for expected in 0..64u16 {
                let frame = reader.read_frame().unwrap();
                assert_eq!(frame.as_bytes(), format!("msg-{expected}").as_bytes());
            }
        });

        for i in 0..64u16 {
            writer.send(format!("msg-{i}").as_bytes()).unwrap();
        }

        reader_thread.join().unwrap();
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Serves one scripted chunk per call and records what the previous
    /// chunk's bytes looked like in the caller's buffer at the next call.
    struct InspectingReader {
        chunks: VecDeque<Vec<u8>>,
        last_len: usize,
        leftovers: Vec<Vec<u8>>,
    }

    impl InspectingReader {
        fn new(chunks: Vec<Vec<u8>>) -> Self {
            Self {
                chunks: chunks.into(),
                last_len: 0,
                leftovers: Vec::new(),
            }
        }
    }

    impl Read for InspectingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.last_len > 0 {
                self.leftovers.push(buf[..self.last_len].to_vec());
            }
            let Some(chunk) = self.chunks.pop_front() else {
                self.last_len = 0;
                return Ok(0);
            };
            buf[..chunk.len()].copy_from_slice(&chunk);
            self.last_len = chunk.len();
            Ok(chunk.len())
        }
    }

    struct WouldBlockReader;

    impl Read for WouldBlockReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }
}
