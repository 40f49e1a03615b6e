//! Authentication hook for validating caller identity.
//!
//! Skirmish doesn't mint or verify credentials itself — that's the
//! account service's job. The server only needs the answer, so the seam
//! is a single-method trait: the handler hands over the raw
//! `Authorization` header value captured at upgrade time, and gets back
//! a [`PlayerId`] or a rejection. Production wires in the real verifier;
//! tests and the demo use simple stand-ins.

use skirmish_protocol::PlayerId;

use crate::AuthError;

/// Validates a caller's credential and returns their identity.
///
/// `Send + Sync + 'static` because one authenticator instance is shared
/// across every connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use skirmish_session::{Authenticator, AuthError};
/// use skirmish_protocol::PlayerId;
///
/// /// Accepts any numeric token as the player id. Development only.
/// struct DevAuth;
///
/// impl Authenticator for DevAuth {
///     async fn authenticate(
///         &self,
///         token: &str,
///     ) -> Result<PlayerId, AuthError> {
///         let id: u64 = token.parse().map_err(|_| {
///             AuthError::Failed("token must be a number".into())
///         })?;
///         Ok(PlayerId(id))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given credential.
    ///
    /// # Returns
    /// - `Ok(PlayerId)` — the caller is this player and the credential is
    ///   still inside its validity window
    /// - `Err(AuthError)` — absent/expired/invalid; the connection is
    ///   closed after the client is notified
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, AuthError>> + Send;
}
