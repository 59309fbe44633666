//! Message framing and ordered delivery over byte pipes.
//!
//! pipeframe turns an ordered byte channel, such as a child process's
//! stdin/stdout, into a stream of whole messages. Two wire formats are
//! supported: NUL-terminated and 4-byte length-prefixed.
//!
//! # Crate Structure
//!
//! - [`frame`]: Framing formats, decoders, erasure, blocking reader/writer
//! - [`transport`]: Event-driven transport with ordered deferred dispatch

/// Re-export frame types.
pub mod frame {
    pub use pipeframe_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use pipeframe_transport::*;
}
