//! Shared fixtures for `PostgreSQL` integration tests.

use mcp_registry::registry::{
    adapters::postgres::{PostgresServerRepository, RegistryPgPool, build_pool},
    domain::{Principal, ServerRecord, ServerSubmission},
};
use mockable::DefaultClock;
use rstest::fixture;
use serde_json::json;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Environment variable naming the test database.
pub const TEST_DATABASE_URL_VAR: &str = "REGISTRY_TEST_DATABASE_URL";

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// Test database handle with a namespace unique to one test.
pub struct PgContext {
    pub pool: RegistryPgPool,
    pub repository: PostgresServerRepository,
    pub namespace: String,
}

impl PgContext {
    /// Returns a server id inside this test's namespace.
    pub fn server_id(&self, name: &str) -> String {
        format!("kp.internal.{}/{name}", self.namespace)
    }

    /// Builds a record inside this test's namespace owned by [`owner`].
    pub fn record(&self, name: &str, tools: &[&str]) -> ServerRecord {
        self.record_owned_by(name, tools, owner())
    }

    /// Builds a record inside this test's namespace owned by `principal`.
    pub fn record_owned_by(
        &self,
        name: &str,
        tools: &[&str],
        principal: Principal,
    ) -> ServerRecord {
        let endpoint = format!("https://mcp.example.com/{name}");
        let tool_values: Vec<_> = tools
            .iter()
            .map(|tool| json!({"name": tool, "description": "tool"}))
            .collect();
        let submission = ServerSubmission::from_json(json!({
            "id": self.server_id(name),
            "name": format!("{name} {}", self.namespace),
            "description": format!("{name} bridge"),
            "version": "1.0.0",
            "endpoint": endpoint,
            "tools": tool_values,
            "auth_methods": ["oauth2"],
            "team": "platform",
            "tags": [self.namespace.clone()],
            "metadata": {"name": name, "endpoint": endpoint}
        }))
        .expect("valid submission");
        ServerRecord::publish(submission, principal, &DefaultClock)
    }
}

/// Principal owning every record built by [`PgContext::record`].
pub fn owner() -> Principal {
    Principal::new("pg-tests@kp.com").expect("valid principal")
}

/// Connects to the test database, applying the schema once per process.
#[fixture]
pub async fn pg() -> PgContext {
    let url = std::env::var(TEST_DATABASE_URL_VAR)
        .unwrap_or_else(|_| panic!("{TEST_DATABASE_URL_VAR} must be set for postgres tests"));
    let pool = build_pool(&url, 4).expect("test database reachable");
    let repository = PostgresServerRepository::new(pool.clone());

    SCHEMA
        .get_or_init(|| async {
            repository.apply_schema().await.expect("schema applies");
            repository
                .ensure_text_index()
                .await
                .expect("text index builds");
        })
        .await;

    PgContext {
        pool,
        repository,
        namespace: format!("t{}", Uuid::new_v4().simple()),
    }
}
