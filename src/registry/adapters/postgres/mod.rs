//! `PostgreSQL` adapters for catalog persistence and auditing.

mod audit;
mod blocking;
mod models;
mod repository;
mod schema;
mod search_sql;

pub use audit::PostgresAuditLog;
pub use blocking::{RegistryPgPool, build_pool};
pub use repository::{BASE_SCHEMA_SQL, PostgresServerRepository, TEXT_INDEX_SQL};
