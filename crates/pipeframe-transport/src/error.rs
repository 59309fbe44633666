use crate::payload::PayloadError;

/// Boxed error returned by message handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// `send` after the pipe was closed. Nothing was written.
    #[error("pipe has been closed")]
    Closed,

    /// `close()` on a transport without a closable resource.
    #[error("close is not supported by this transport")]
    UnsupportedClose,

    /// The closable resource failed to close.
    #[error("close failed: {0}")]
    Close(#[source] std::io::Error),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] pipeframe_frame::FrameError),

    /// An outgoing message could not be encoded. Nothing was written.
    #[error("could not encode message: {0}")]
    Encode(#[source] PayloadError),

    /// A delivered payload could not be decoded. The message was dropped.
    #[error("malformed payload: {0}")]
    Malformed(#[source] PayloadError),

    /// The message handler returned an error.
    #[error("message handler failed: {0}")]
    Handler(#[source] BoxError),

    /// An I/O error occurred on the underlying pipe.
    #[error("pipe I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
