//! Error types for the protocol layer.
//!
//! The `#[error("...")]` strings double as wire text: when a handler
//! rejects a frame it sends `err.to_string()` back inside an `ERROR`
//! message, so the exact phrasing here is part of the protocol.

/// Errors that can occur while reading or writing wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is not valid JSON.
    #[error("data is not JSON serializable")]
    NotJson(#[source] serde_json::Error),

    /// The frame is JSON but has no `type` field to dispatch on.
    #[error("incorrect data typing")]
    MissingType,

    /// A `connect` request without a `deck_id` field.
    #[error("deck id is not provided")]
    DeckIdMissing,

    /// A `deck_id` that is present but not a non-negative integer
    /// (numeric strings are coerced, anything else is rejected).
    #[error("deck id is incorrect")]
    DeckIdInvalid,

    /// A `move` request with missing or non-numeric coordinates.
    #[error("move data is incorrect")]
    MoveInvalid,

    /// Serializing an outbound message failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}
