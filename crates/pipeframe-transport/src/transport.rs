use std::fmt;
use std::io::{self, Write};

use pipeframe_frame::{ByteOrder, FrameConfig, FrameDecoder, FrameWriter, Framing};
use tracing::{debug, trace, warn};

use crate::channel::{ChannelEvent, Closer};
use crate::dispatch::{Delivery, Dispatcher, HandlerResult};
use crate::error::{Result, TransportError};
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::payload::PayloadCodec;

/// One end of a framed message pipe.
///
/// Feed it channel events ([`Transport::handle_event`] or the `on_*`
/// methods); decoded messages are queued and delivered to the message
/// handler only when the owner drains the queue with
/// [`Transport::dispatch_pending`]. Outgoing messages are framed and written
/// to `W` by [`Transport::send`].
pub struct Transport<W, C: PayloadCodec> {
    decoder: FrameDecoder,
    writer: FrameWriter<W>,
    closer: Option<Box<dyn Closer>>,
    codec: C,
    dispatcher: Dispatcher<C::Message>,
    lifecycle: Lifecycle,
}

impl<W: Write, C: PayloadCodec> Transport<W, C> {
    /// Create a transport with default frame configuration.
    pub fn new(writer: W, framing: Framing, codec: C) -> Self {
        Self::with_config(writer, framing, FrameConfig::default(), codec)
    }

    /// Create a transport with explicit frame configuration.
    pub fn with_config(writer: W, framing: Framing, config: FrameConfig, codec: C) -> Self {
        Self {
            decoder: FrameDecoder::new(framing, &config),
            writer: FrameWriter::with_config(writer, framing, config),
            closer: None,
            codec,
            dispatcher: Dispatcher::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// NUL-delimited transport.
    pub fn nul(writer: W, codec: C) -> Self {
        Self::new(writer, Framing::Nul, codec)
    }

    /// Length-prefixed transport with the given header byte order.
    pub fn length_prefixed(writer: W, byte_order: ByteOrder, codec: C) -> Self {
        let config = FrameConfig {
            byte_order,
            ..FrameConfig::default()
        };
        Self::with_config(writer, Framing::LengthPrefixed, config, codec)
    }

    /// Attach the resource that [`Transport::close`] shuts down.
    pub fn with_closer(mut self, closer: impl Closer + 'static) -> Self {
        self.closer = Some(Box::new(closer));
        self
    }

    /// Route one channel notification to the matching `on_*` method.
    pub fn handle_event(&mut self, event: ChannelEvent<'_>) -> Result<()> {
        match event {
            ChannelEvent::Data(chunk) => self.on_data(chunk).map(drop),
            ChannelEvent::End => {
                self.on_end();
                Ok(())
            }
            ChannelEvent::Close => {
                self.on_close();
                Ok(())
            }
            ChannelEvent::Error(err) => {
                self.on_error(&err);
                Ok(())
            }
        }
    }

    /// Consume one raw chunk and queue every message it completes.
    ///
    /// Never runs the message handler. Returns the number of messages
    /// queued. A framing violation erases the reassembly buffer, closes
    /// the transport and is returned. Chunks arriving after close are
    /// ignored.
    pub fn on_data(&mut self, chunk: &[u8]) -> Result<usize> {
        if self.lifecycle.is_closed() {
            trace!(size = chunk.len(), "data after close ignored");
            return Ok(0);
        }

        // Messages completed ahead of a framing violation are still queued.
        let mut messages = Vec::new();
        let result = self.decoder.push_into(chunk, &mut messages);
        let queued = self.dispatcher.enqueue(messages);
        if queued > 0 {
            debug!(
                queued,
                pending = self.dispatcher.pending(),
                "messages queued for dispatch"
            );
        }

        match result {
            Ok(()) => Ok(queued),
            Err(err) => {
                warn!(error = %err, "framing violation; closing pipe");
                self.decoder.reset();
                self.on_close();
                Err(err.into())
            }
        }
    }

    /// The read side reached EOF. Any partial message is erased.
    pub fn on_end(&mut self) {
        if self.decoder.has_partial() {
            debug!(discarded = self.decoder.buffered(), "partial message at end of stream");
        }
        self.decoder.reset();
        self.lifecycle.mark_unreadable();
    }

    /// The channel closed. Queued messages are still delivered.
    pub fn on_close(&mut self) {
        self.decoder.reset();
        self.lifecycle.close();
    }

    /// The channel reported an error. Logged only.
    pub fn on_error(&mut self, err: &io::Error) {
        warn!(error = %err, kind = ?err.kind(), "pipe error");
    }

    /// Replace the message handler. Applies to queued messages too.
    pub fn set_message_handler<F>(&mut self, handler: F)
    where
        F: FnMut(C::Message) -> HandlerResult + 'static,
    {
        self.dispatcher.set_handler(Some(Box::new(handler)));
    }

    /// Remove the message handler; messages dispatched without one are
    /// erased and dropped.
    pub fn clear_message_handler(&mut self) {
        self.dispatcher.set_handler(None);
    }

    /// Replace the close callback. Runs immediately if the read side is
    /// already gone.
    pub fn set_close_handler<F>(&mut self, handler: F)
    where
        F: FnMut() + 'static,
    {
        self.lifecycle.set_on_close(Some(Box::new(handler)));
    }

    pub fn clear_close_handler(&mut self) {
        self.lifecycle.set_on_close(None);
    }

    /// Encode, frame and write one message.
    ///
    /// Fails with [`TransportError::Closed`] without touching the writer
    /// once the pipe has closed.
    pub fn send(&mut self, message: &C::Outgoing) -> Result<()> {
        self.lifecycle.ensure_open()?;
        let payload = self
            .codec
            .encode(message)
            .map_err(TransportError::Encode)?;
        self.writer.send(&payload)?;
        Ok(())
    }

    /// Ask the attached resource to close.
    ///
    /// The transport itself becomes `Closed` when the channel reports the
    /// close event. Without a closer this always fails.
    pub fn close(&mut self) -> Result<()> {
        let Some(closer) = self.closer.as_mut() else {
            return Err(TransportError::UnsupportedClose);
        };
        if self.lifecycle.is_closed() {
            return Ok(());
        }
        closer.close().map_err(TransportError::Close)
    }

    /// Deliver the oldest queued message.
    pub fn dispatch_next(&mut self) -> Result<Option<Delivery>> {
        self.dispatcher.dispatch_next(&self.codec)
    }

    /// Deliver queued messages in order until the queue is empty or one
    /// fails. Returns how many ran.
    pub fn dispatch_pending(&mut self) -> Result<usize> {
        self.dispatcher.dispatch_pending(&self.codec)
    }

    pub fn pending_dispatches(&self) -> usize {
        self.dispatcher.pending()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }

    /// False once the read side has ended or closed.
    pub fn is_readable(&self) -> bool {
        self.lifecycle.is_readable()
    }

    pub fn framing(&self) -> Framing {
        self.writer.framing()
    }

    pub fn config(&self) -> &FrameConfig {
        self.writer.config()
    }

    /// Bytes of an unfinished incoming message.
    pub fn buffered(&self) -> usize {
        self.decoder.buffered()
    }

    /// Borrow the writer.
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Mutably borrow the writer.
    pub fn get_mut(&mut self) -> &mut W {
        self.writer.get_mut()
    }
}

impl<W, C: PayloadCodec> fmt::Debug for Transport<W, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("framing", &self.decoder.framing())
            .field("buffered", &self.decoder.buffered())
            .field("dispatcher", &self.dispatcher)
            .field("lifecycle", &self.lifecycle)
            .field("has_closer", &self.closer.is_some())
            .finish()
    }
}
