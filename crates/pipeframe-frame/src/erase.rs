//! Zero-fill of consumed message bytes.
//!
//! Every buffer that held message data is overwritten with zeros once its
//! contents are no longer needed: parsed headers, delivered payloads, and
//! the encode buffer after a write.

use std::fmt;
use std::ops::Deref;

use bytes::BytesMut;
use zeroize::Zeroize;

/// Overwrite `buf` with zeros.
pub fn erase(buf: &mut [u8]) {
    buf.zeroize();
}

/// Append `chunk` to `buf` without leaving a stale copy behind.
///
/// `BytesMut` reallocates by copying into a new allocation and freeing the
/// old one untouched. When `chunk` does not fit in the spare capacity this
/// moves the contents into a fresh buffer itself and zeroes the old view.
pub(crate) fn extend_erasing(buf: &mut BytesMut, chunk: &[u8]) {
    if buf.capacity() - buf.len() >= chunk.len() {
        buf.extend_from_slice(chunk);
        return;
    }

    let wanted = (buf.len() + chunk.len()).max(buf.capacity().saturating_mul(2));
    let mut grown = BytesMut::with_capacity(wanted);
    grown.extend_from_slice(buf);
    grown.extend_from_slice(chunk);
    erase(buf);
    *buf = grown;
}

/// Owned message bytes that are zeroed on drop.
///
/// `Debug` never prints the contents.
pub struct SecretBytes {
    buf: BytesMut,
}

impl SecretBytes {
    /// Wrap an existing buffer.
    pub fn new(buf: BytesMut) -> Self {
        Self { buf }
    }

    /// An empty message.
    pub fn empty() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Borrow the message bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Zero the contents in place. The length is unchanged.
    pub fn erase(&mut self) {
        erase(&mut self.buf);
    }

    /// True when every byte is zero (vacuously true when empty).
    pub fn is_zeroed(&self) -> bool {
        self.buf.iter().all(|b| *b == 0)
    }
}

impl Deref for SecretBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.buf
    }
}

impl AsRef<[u8]> for SecretBytes {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl From<&[u8]> for SecretBytes {
    fn from(bytes: &[u8]) -> Self {
        Self::new(BytesMut::from(bytes))
    }
}

impl From<Vec<u8>> for SecretBytes {
    /// Copies into a new buffer and zeroes the vector.
    fn from(mut bytes: Vec<u8>) -> Self {
        let secret = Self::new(BytesMut::from(&bytes[..]));
        bytes.zeroize();
        secret
    }
}

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.erase();
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretBytes")
            .field(&format_args!("<redacted:{} bytes>", self.buf.len()))
            .finish()
    }
}

/// Erases the borrowed message when it goes out of scope.
///
/// Runs on every exit path, including early `?` returns and unwinding.
pub struct EraseGuard<'a> {
    bytes: &'a mut SecretBytes,
}

impl<'a> EraseGuard<'a> {
    pub fn new(bytes: &'a mut SecretBytes) -> Self {
        Self { bytes }
    }
}

impl Deref for EraseGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes.as_bytes()
    }
}

impl Drop for EraseGuard<'_> {
    fn drop(&mut self) {
        self.bytes.erase();
    }
}
