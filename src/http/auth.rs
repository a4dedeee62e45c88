//! Bearer-token extraction for mutating routes.

use super::{ApiError, AppState};
use crate::registry::{domain::Principal, ports::AuthenticationError};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::debug;

/// Principal authenticated from the `Authorization: Bearer` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequestParts<AppState> for AuthenticatedPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthenticationError::MissingCredential)?;

        let principal = state
            .authenticator()
            .authenticate(token)
            .inspect_err(|err| debug!(error = %err, "bearer token rejected"))?;
        Ok(Self(principal))
    }
}
