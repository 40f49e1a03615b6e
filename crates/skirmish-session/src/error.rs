//! Error types for authentication.

/// Why a credential was rejected.
///
/// Whatever the cause, clients are told the same fixed wire text; the
/// detail here is for server logs only.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The credential is absent, malformed, expired, or names no known
    /// player.
    #[error("authentication failed: {0}")]
    Failed(String),
}
