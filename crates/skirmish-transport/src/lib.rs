//! WebSocket transport for Skirmish.
//!
//! Accepts persistent client connections and exposes them as text-frame
//! streams. Unlike a generic byte transport, the accept path also captures
//! the two pieces of the HTTP upgrade request the server routes on:
//!
//! - the URI **path** (`/queue` vs `/room/<slug>`), and
//! - the **`Authorization` header** carrying the caller's credential.
//!
//! Both are read exactly once at accept time and handed to the connection
//! handler as a [`ConnectRequest`] — no handler ever re-inspects HTTP
//! state after the upgrade.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{ConnectRequest, WsConnection, WsListener};

use std::fmt;

/// Opaque identifier for a connection, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
