//! Identity port: turns a bearer credential into a principal.

use crate::registry::domain::Principal;
use thiserror::Error;

/// Resolves bearer credentials to authenticated principals.
///
/// Verification is local and synchronous; remote identity providers are
/// outside this crate.
pub trait Authenticator: Send + Sync {
    /// Authenticates a raw bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when the token is malformed, carries a
    /// bad signature or has expired.
    fn authenticate(&self, token: &str) -> Result<Principal, AuthenticationError>;
}

/// Credential failures, all surfaced as 401.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthenticationError {
    /// No bearer credential was presented.
    #[error("missing bearer token")]
    MissingCredential,

    /// The token could not be decoded.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token signature does not verify.
    #[error("invalid token signature")]
    BadSignature,

    /// The token is past its expiry time.
    #[error("token expired")]
    Expired,
}
