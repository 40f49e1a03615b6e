//! Error types for matchmaking.

/// Errors that can occur while joining the queue.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The deck doesn't exist — or exists but belongs to someone else.
    /// One message for both cases so deck ids can't be probed.
    #[error("such deck doesn't exist")]
    DeckNotFound,

    /// The deck score provider itself failed.
    #[error("deck provider failed: {0}")]
    Provider(String),
}
