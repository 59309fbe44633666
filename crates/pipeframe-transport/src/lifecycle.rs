use std::fmt;

use tracing::debug;

use crate::error::{Result, TransportError};

/// Close notification callback.
pub type CloseHandler = Box<dyn FnMut()>;

/// Open/Closed status of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Open,
    Closed,
}

/// Tracks whether the pipe is still usable and owns the close callback.
///
/// `Open → Closed` is one-way. The read side can stop being readable (EOF)
/// before the close event arrives.
pub struct Lifecycle {
    state: LifecycleState,
    readable: bool,
    on_close: Option<CloseHandler>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Open,
            readable: true,
            on_close: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == LifecycleState::Closed
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// Fail with [`TransportError::Closed`] once closed.
    pub fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    /// Replace the close callback. When the read side is already gone the
    /// new callback runs immediately.
    pub fn set_on_close(&mut self, handler: Option<CloseHandler>) {
        self.on_close = handler;
        if !self.readable {
            if let Some(on_close) = self.on_close.as_mut() {
                on_close();
            }
        }
    }

    pub fn has_close_handler(&self) -> bool {
        self.on_close.is_some()
    }

    /// The read side reached EOF.
    pub fn mark_unreadable(&mut self) {
        self.readable = false;
    }

    /// Record the close event. Returns `false` if already closed; the
    /// callback runs only on the first close.
    pub fn close(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.state = LifecycleState::Closed;
        self.readable = false;
        debug!("pipe closed");
        if let Some(on_close) = self.on_close.as_mut() {
            on_close();
        }
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("state", &self.state)
            .field("readable", &self.readable)
            .field("has_close_handler", &self.on_close.is_some())
            .finish()
    }
}
