//! Payload codecs: how message bytes map to handler values.
//!
//! Framing only finds message boundaries. Turning the bytes inside a frame
//! into a value happens at dispatch time through one of these codecs.

use std::fmt;
use std::marker::PhantomData;

use pipeframe_frame::SecretBytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Errors raised while encoding or decoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Converts between message values and payload bytes.
pub trait PayloadCodec {
    /// What `send` accepts.
    type Outgoing: ?Sized;
    /// What the message handler receives.
    type Message;

    fn encode(&self, message: &Self::Outgoing) -> Result<SecretBytes, PayloadError>;

    fn decode(&self, payload: &[u8]) -> Result<Self::Message, PayloadError>;
}

/// UTF-8 text messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl PayloadCodec for Text {
    type Outgoing = str;
    type Message = String;

    fn encode(&self, message: &str) -> Result<SecretBytes, PayloadError> {
        Ok(SecretBytes::from(message.as_bytes()))
    }

    fn decode(&self, payload: &[u8]) -> Result<String, PayloadError> {
        Ok(std::str::from_utf8(payload)?.to_owned())
    }
}

/// Uninterpreted bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl PayloadCodec for Raw {
    type Outgoing = [u8];
    type Message = Vec<u8>;

    fn encode(&self, message: &[u8]) -> Result<SecretBytes, PayloadError> {
        Ok(SecretBytes::from(message))
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<u8>, PayloadError> {
        Ok(payload.to_vec())
    }
}

/// JSON documents, serialized with serde.
pub struct Json<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Json<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Json")
    }
}

impl<T: Serialize + DeserializeOwned> PayloadCodec for Json<T> {
    type Outgoing = T;
    type Message = T;

    fn encode(&self, message: &T) -> Result<SecretBytes, PayloadError> {
        Ok(SecretBytes::from(serde_json::to_vec(message)?))
    }

    fn decode(&self, payload: &[u8]) -> Result<T, PayloadError> {
        Ok(serde_json::from_slice(payload)?)
    }
}
