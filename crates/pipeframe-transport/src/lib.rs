//! Event-driven message transport over framed byte pipes.
//!
//! Wraps one end of an ordered byte channel (typically a child process's
//! stdin/stdout) and exposes whole messages:
//! - raw chunks go in through [`Transport::on_data`] (or a pump)
//! - complete messages are queued and delivered to the registered handler
//!   on a later turn, strictly in arrival order
//! - [`Transport::send`] frames and writes outgoing messages
//!
//! Framing itself lives in `pipeframe-frame`.

#[cfg(feature = "async")]
pub mod async_pump;
pub mod channel;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod payload;
pub mod pump;
pub mod transport;

#[cfg(feature = "async")]
pub use async_pump::pump_async;
pub use channel::{ChannelEvent, Closer};
pub use dispatch::{Delivery, Dispatcher, HandlerResult, MessageHandler};
pub use error::{BoxError, Result, TransportError};
pub use lifecycle::{CloseHandler, Lifecycle, LifecycleState};
pub use payload::{Json, PayloadCodec, PayloadError, Raw, Text};
pub use pump::pump;
pub use transport::Transport;

pub use pipeframe_frame::{ByteOrder, FrameConfig, Framing};
