//! Drive a [`Transport`] from a tokio reader.

use std::io::{ErrorKind, Write};

use pipeframe_frame::erase;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::payload::PayloadCodec;
use crate::pump::READ_CHUNK_SIZE;
use crate::transport::Transport;

/// Async counterpart of [`crate::pump::pump`].
///
/// Yields to the runtime after every data callback so that delivery runs
/// on a later turn. The transport holds non-`Send` callbacks, so run this
/// on a current-thread runtime or a `LocalSet`.
pub async fn pump_async<R, W, C>(
    reader: &mut R,
    transport: &mut Transport<W, C>,
) -> Result<usize>
where
    R: AsyncRead + Unpin,
    W: Write,
    C: PayloadCodec,
{
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut dispatched = 0usize;

    loop {
        let read = match reader.read(&mut chunk).await {
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
            tokio::task::yield_now().await;
            dispatched += transport.dispatch_pending()?;
            debug!(dispatched, "async pump reached end of stream");
            return Ok(dispatched);
        }

        let queued = transport.on_data(&chunk[..read]);
        erase(&mut chunk[..read]);

        tokio::task::yield_now().await;
        dispatched += transport.dispatch_pending()?;
        queued?;
    }
}
