//! HMAC-signed bearer tokens.
//!
//! Token format: `base64url(payload).base64url(signature)` where the payload
//! is the JSON claims object `{sub, iat, exp}` and the signature is
//! HMAC-SHA256 over the encoded payload.

use crate::registry::{
    domain::Principal,
    ports::{AuthenticationError, Authenticator},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Duration;
use hmac::{Hmac, Mac};
use mockable::{Clock, DefaultClock};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Freshly minted bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Encoded token to send as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Lifetime in seconds from issue time.
    pub expires_in: i64,
}

/// Errors raised while minting a token.
#[derive(Debug, Error)]
pub enum TokenIssueError {
    /// The claims could not be encoded.
    #[error("failed to encode token claims: {0}")]
    Encode(#[from] serde_json::Error),

    /// The signing key was rejected by the MAC.
    #[error("invalid signing key")]
    InvalidKey,
}

/// Issues and verifies HMAC-signed bearer tokens.
pub struct SignedTokenAuthenticator<C = DefaultClock> {
    secret: Vec<u8>,
    ttl: Duration,
    clock: C,
}

impl std::fmt::Debug for SignedTokenAuthenticator {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SignedTokenAuthenticator")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SignedTokenAuthenticator {
    /// Creates an authenticator using the system clock.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self::with_clock(secret, ttl, DefaultClock)
    }
}

impl<C: Clock> SignedTokenAuthenticator<C> {
    /// Creates an authenticator reading time from `clock`.
    #[must_use]
    pub fn with_clock(secret: impl Into<Vec<u8>>, ttl: Duration, clock: C) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            clock,
        }
    }

    /// Returns the lifetime given to issued tokens.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mints a token for `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenIssueError`] when the claims cannot be encoded or the
    /// key is rejected.
    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken, TokenIssueError> {
        let issued_at = self.clock.utc().timestamp();
        let claims = TokenClaims {
            sub: principal.as_str().to_owned(),
            iat: issued_at,
            exp: issued_at + self.ttl.num_seconds(),
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let mut mac = self.mac().ok_or(TokenIssueError::InvalidKey)?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(IssuedToken {
            access_token: format!("{payload}.{signature}"),
            expires_in: self.ttl.num_seconds(),
        })
    }

    fn mac(&self) -> Option<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret).ok()
    }
}

impl<C: Clock + Send + Sync> Authenticator for SignedTokenAuthenticator<C> {
    fn authenticate(&self, token: &str) -> Result<Principal, AuthenticationError> {
        let (payload, encoded_signature) = token
            .split_once('.')
            .ok_or_else(|| {
                AuthenticationError::Malformed("expected payload.signature".to_owned())
            })?;

        let signature = URL_SAFE_NO_PAD
            .decode(encoded_signature)
            .map_err(|err| AuthenticationError::Malformed(err.to_string()))?;
        let mut mac = self.mac().ok_or(AuthenticationError::BadSignature)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthenticationError::BadSignature)?;

        let claims: TokenClaims = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|err| AuthenticationError::Malformed(err.to_string()))
            .and_then(|bytes| {
                serde_json::from_slice(&bytes)
                    .map_err(|err| AuthenticationError::Malformed(err.to_string()))
            })?;

        if claims.exp <= self.clock.utc().timestamp() {
            return Err(AuthenticationError::Expired);
        }

        Principal::new(claims.sub).map_err(|err| AuthenticationError::Malformed(err.to_string()))
    }
}
