//! Drive a [`Transport`] from a blocking reader.

use std::io::{ErrorKind, Read, Write};

use pipeframe_frame::erase;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::payload::PayloadCodec;
use crate::transport::Transport;

pub(crate) const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Read `reader` to EOF, feeding every chunk to `transport` and delivering
/// the messages it completes.
///
/// Delivery happens after each data callback returns, never inside it.
/// At EOF the transport sees `end` then `close`, and whatever is still
/// queued is delivered. Returns the number of messages dispatched.
///
/// A read error is reported to the transport and returned. A dispatch error
/// is returned as is; undelivered messages stay queued. A framing error is
/// returned after the messages completed before it are delivered.
pub fn pump<R, W, C>(reader: &mut R, transport: &mut Transport<W, C>) -> Result<usize>
where
    R: Read,
    W: Write,
    C: PayloadCodec,
{
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut dispatched = 0usize;

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                transport.on_error(&err);
                return Err(TransportError::Io(err));
            }
        };

        if read == 0 {
            transport.on_end();
            transport.on_close();
            dispatched += transport.dispatch_pending()?;
            debug!(dispatched, "pump reached end of stream");
            return Ok(dispatched);
        }

        let queued = transport.on_data(&chunk[..read]);
        erase(&mut chunk[..read]);

        // Messages completed ahead of a framing violation go out before it.
        dispatched += transport.dispatch_pending()?;
        queued?;
    }
}
