//! Codec trait and the JSON implementation.
//!
//! A codec converts typed messages to and from text frames. The handlers
//! don't care how messages are serialized — they go through the [`Codec`]
//! trait, so a different encoding can be swapped in without touching the
//! routing code. JSON is the only implementation today; the browser
//! client reads it directly.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts between typed messages and text frames.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a frame back into a value.
    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::NotJson)
    }
}
