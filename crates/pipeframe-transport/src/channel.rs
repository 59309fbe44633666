//! What the transport consumes from the underlying pipe.

use std::io;

/// A notification from the raw byte channel, delivered in order.
#[derive(Debug)]
pub enum ChannelEvent<'a> {
    /// The next chunk of bytes. Chunk boundaries carry no meaning.
    Data(&'a [u8]),
    /// The read side reached EOF; no more data will arrive.
    End,
    /// The channel is closed.
    Close,
    /// The channel reported an error. This alone does not close it.
    Error(io::Error),
}

/// A resource the transport can close on request, such as the write end of
/// a pipe or a child process handle.
pub trait Closer {
    fn close(&mut self) -> io::Result<()>;
}

impl<F> Closer for F
where
    F: FnMut() -> io::Result<()>,
{
    fn close(&mut self) -> io::Result<()> {
        self()
    }
}
