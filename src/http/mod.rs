//! HTTP surface of the registry.
//!
//! Every catalog route lives under `/v0`. Reads are anonymous; writes need a
//! bearer token. Server ids contain `/`, so clients percent-encode them in
//! paths.

mod auth;
mod error;
mod handlers;

pub use auth::AuthenticatedPrincipal;
pub use error::ApiError;

use crate::registry::{
    adapters::token::SignedTokenAuthenticator,
    domain::Principal,
    ports::{AuditLog, Authenticator, ServerRepository},
    services::RegistryService,
};
use axum::{
    Router,
    routing::{get, post},
};
use mockable::DefaultClock;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Catalog service with type-erased store and audit sink.
pub type SharedRegistry = RegistryService<dyn ServerRepository, dyn AuditLog, DefaultClock>;

/// Token minting available only in development mode.
#[derive(Clone)]
pub struct DevTokens {
    issuer: Arc<SignedTokenAuthenticator>,
    user: Principal,
}

impl DevTokens {
    /// Creates dev token support minting tokens for `user`.
    #[must_use]
    pub const fn new(issuer: Arc<SignedTokenAuthenticator>, user: Principal) -> Self {
        Self { issuer, user }
    }
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<SharedRegistry>,
    authenticator: Arc<dyn Authenticator>,
    dev_tokens: Option<DevTokens>,
}

impl AppState {
    /// Creates handler state. `dev_tokens` is `Some` only in development
    /// mode.
    #[must_use]
    pub fn new(
        registry: Arc<SharedRegistry>,
        authenticator: Arc<dyn Authenticator>,
        dev_tokens: Option<DevTokens>,
    ) -> Self {
        Self {
            registry,
            authenticator,
            dev_tokens,
        }
    }

    /// Returns the catalog service.
    #[must_use]
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Returns the bearer-token verifier.
    #[must_use]
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    /// Returns whether development mode is active.
    #[must_use]
    pub const fn is_dev_mode(&self) -> bool {
        self.dev_tokens.is_some()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v0/servers",
            get(handlers::list_servers).post(handlers::publish_server),
        )
        .route(
            "/v0/servers/{id}",
            get(handlers::get_server)
                .put(handlers::update_server)
                .delete(handlers::delete_server),
        )
        .route("/v0/servers/{id}/tools", get(handlers::get_server_tools))
        .route("/v0/health", get(handlers::health))
        .route("/dev/token", get(handlers::dev_token))
        .route("/auth/token", post(handlers::auth_token))
        .fallback(handlers::route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
