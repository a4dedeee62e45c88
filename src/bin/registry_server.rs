//! Runs the MCP registry HTTP server.
//!
//! Configuration comes from `REGISTRY_*` environment variables, optionally
//! seeded from a `.env` file. Without `REGISTRY_DATABASE_URL` the catalog
//! lives in memory and is lost on exit.

use mcp_registry::{
    config::RegistryConfig,
    http::{self, AppState, DevTokens, SharedRegistry},
    registry::{
        adapters::{
            memory::{InMemoryAuditLog, InMemoryServerRepository},
            postgres::{PostgresAuditLog, PostgresServerRepository, build_pool},
            token::SignedTokenAuthenticator,
        },
        ports::{AuditLog, ServerRepository},
        services::{OwnershipGuard, RegistryService, SearchQueryBuilder},
    },
    telemetry,
};
use mockable::DefaultClock;
use std::sync::Arc;
use tracing::{info, warn};

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Stores = (Arc<dyn ServerRepository>, Arc<dyn AuditLog>);

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = RegistryConfig::from_env()?;
    telemetry::init(&config.log_filter);

    info!(
        dev_mode = config.is_dev_mode(),
        bind_addr = %config.bind_addr,
        persistent = config.database_url.is_some(),
        text_search = ?config.text_search,
        "starting registry"
    );

    let (repository, audit_log) = open_stores(&config).await?;
    let registry: Arc<SharedRegistry> = Arc::new(RegistryService::new(
        repository,
        audit_log,
        OwnershipGuard::new(config.namespace_policy()),
        SearchQueryBuilder::new(config.capability_probe()),
        Arc::new(DefaultClock),
    ));

    let authenticator = Arc::new(SignedTokenAuthenticator::new(
        config.token_secret.as_bytes(),
        config.token_ttl,
    ));
    let dev_tokens = config
        .is_dev_mode()
        .then(|| DevTokens::new(Arc::clone(&authenticator), config.mock_user.clone()));
    let state = AppState::new(registry, authenticator, dev_tokens);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(address = %listener.local_addr()?, "listening");
    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("registry stopped");
    Ok(())
}

async fn open_stores(config: &RegistryConfig) -> Result<Stores, BoxError> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("no database configured, using the in-memory catalog");
        return Ok((
            Arc::new(InMemoryServerRepository::new()),
            Arc::new(InMemoryAuditLog::new()),
        ));
    };

    let pool = build_pool(database_url, config.database_pool_size)?;
    let repository = PostgresServerRepository::new(pool.clone());
    repository.apply_schema().await?;
    if let Err(err) = repository.ensure_text_index().await {
        warn!(error = %err, "full-text index unavailable");
    }

    Ok((Arc::new(repository), Arc::new(PostgresAuditLog::new(pool))))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
