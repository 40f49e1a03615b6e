//! Caller identity for Skirmish.
//!
//! Credential issuance lives in an external account service; this crate
//! only answers "is this caller player P, and is the credential still
//! valid" through the [`Authenticator`] trait, and carries the answer
//! around as an explicit [`ClientSession`] — populated once when a
//! connection attaches, passed to every handler, never smuggled through
//! ambient connection state.

mod auth;
mod error;
mod session;

pub use auth::Authenticator;
pub use error::AuthError;
pub use session::ClientSession;
