//! Per-connection session state.

use std::time::Instant;

use skirmish_protocol::PlayerId;

/// The authenticated context of one live connection.
///
/// Built exactly once, right after the credential check succeeds, and
/// passed explicitly to the channel handlers. Reconnecting creates a
/// fresh session; nothing survives from the previous connection.
#[derive(Debug, Clone)]
pub struct ClientSession {
    /// Who the caller is.
    pub player_id: PlayerId,
    /// When this connection authenticated.
    pub authenticated_at: Instant,
}

impl ClientSession {
    /// Creates a session for a just-authenticated connection.
    pub fn new(player_id: PlayerId) -> Self {
        tracing::debug!(%player_id, "session established");
        Self {
            player_id,
            authenticated_at: Instant::now(),
        }
    }
}
