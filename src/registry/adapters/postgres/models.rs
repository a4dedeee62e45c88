//! Diesel row models for catalog persistence.

use super::schema::{audit_entries, servers};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for catalog records.
///
/// The internal `row_id` is deliberately not selected.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerRow {
    /// Namespace-prefixed server identifier.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub server_id: String,
    /// Record document.
    #[diesel(sql_type = diesel::sql_types::Jsonb)]
    pub document: Value,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub updated_at: DateTime<Utc>,
}

/// Column values for a catalog upsert.
#[derive(Debug, Clone)]
pub struct NewServerRow {
    /// Namespace-prefixed server identifier.
    pub server_id: String,
    /// Record document.
    pub document: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Count result for search queries.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct CountRow {
    /// Number of matching rows.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub total: i64,
}

/// Row returned by a catalog upsert that wrote the document.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct UpsertRow {
    /// Whether the row was inserted rather than replaced.
    #[diesel(sql_type = diesel::sql_types::Bool)]
    pub inserted: bool,
}

/// Insert model for audit entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_entries)]
pub struct NewAuditEntryRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Mutation kind.
    pub action: String,
    /// Acting principal.
    pub user_id: String,
    /// Affected server identifier.
    pub server_id: Option<String>,
    /// Free-form details.
    pub details: Value,
    /// Entry timestamp.
    pub recorded_at: DateTime<Utc>,
}
