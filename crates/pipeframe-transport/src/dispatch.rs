//! Ordered, deferred delivery of decoded messages.
//!
//! Decoding a chunk only enqueues. Handlers run when the owner drains the
//! queue, which is never from inside the data callback. Tasks run one at a
//! time in the order their messages were extracted.

use std::collections::VecDeque;
use std::fmt;

use pipeframe_frame::{EraseGuard, SecretBytes};
use tracing::trace;

use crate::error::{BoxError, Result, TransportError};
use crate::payload::PayloadCodec;

pub type HandlerResult = std::result::Result<(), BoxError>;

/// The single message subscriber.
pub type MessageHandler<M> = Box<dyn FnMut(M) -> HandlerResult>;

/// What happened to one dispatched message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The handler received the message.
    Delivered,
    /// No handler was registered when the task ran; the message was erased.
    Dropped,
}

/// One queued message awaiting delivery.
pub struct PendingDispatch {
    seq: u64,
    payload: SecretBytes,
}

impl PendingDispatch {
    /// Deliver to `handler` (looked up by the caller at run time), then
    /// erase the payload whether decoding or the handler succeeded, failed
    /// or panicked.
    fn run<C: PayloadCodec>(
        &mut self,
        codec: &C,
        handler: Option<&mut MessageHandler<C::Message>>,
    ) -> Result<Delivery> {
        let payload = EraseGuard::new(&mut self.payload);

        let Some(handler) = handler else {
            trace!(seq = self.seq, size = payload.len(), "no message handler; dropping");
            return Ok(Delivery::Dropped);
        };

        let message = codec.decode(&payload).map_err(TransportError::Malformed)?;
        handler(message).map_err(TransportError::Handler)?;
        Ok(Delivery::Delivered)
    }
}

impl fmt::Debug for PendingDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingDispatch")
            .field("seq", &self.seq)
            .field("size", &self.payload.len())
            .finish()
    }
}

/// FIFO queue of pending deliveries plus the current handler slot.
pub struct Dispatcher<M> {
    queue: VecDeque<PendingDispatch>,
    handler: Option<MessageHandler<M>>,
    next_seq: u64,
}

impl<M> Dispatcher<M> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            handler: None,
            next_seq: 0,
        }
    }

    /// Queue messages for delivery, preserving their order.
    pub fn enqueue(&mut self, messages: impl IntoIterator<Item = SecretBytes>) -> usize {
        let before = self.queue.len();
        for payload in messages {
            self.queue.push_back(PendingDispatch {
                seq: self.next_seq,
                payload,
            });
            self.next_seq += 1;
        }
        self.queue.len() - before
    }

    /// Replace the handler. The last one set wins.
    pub fn set_handler(&mut self, handler: Option<MessageHandler<M>>) {
        self.handler = handler;
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Messages queued but not yet delivered.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run the oldest task, if any.
    ///
    /// The handler is read at this moment, not when the message was queued.
    /// A decode or handler error is returned after the payload is erased;
    /// the message is not retried and later tasks stay queued.
    pub fn dispatch_next<C>(&mut self, codec: &C) -> Result<Option<Delivery>>
    where
        C: PayloadCodec<Message = M>,
    {
        let Some(mut task) = self.queue.pop_front() else {
            return Ok(None);
        };
        task.run(codec, self.handler.as_mut()).map(Some)
    }

    /// Run tasks until the queue is empty or one fails.
    ///
    /// Returns how many tasks ran. On error the failing message is gone and
    /// the rest remain queued for the next call.
    pub fn dispatch_pending<C>(&mut self, codec: &C) -> Result<usize>
    where
        C: PayloadCodec<Message = M>,
    {
        let mut ran = 0usize;
        while self.dispatch_next(codec)?.is_some() {
            ran += 1;
        }
        Ok(ran)
    }
}

impl<M> Default for Dispatcher<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for Dispatcher<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.queue.len())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}
