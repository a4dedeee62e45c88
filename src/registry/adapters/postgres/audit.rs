//! `PostgreSQL` append-only audit log.

use super::{
    blocking::{RegistryPgPool, run_blocking},
    models::NewAuditEntryRow,
    schema::audit_entries,
};
use crate::registry::{
    domain::AuditEntry,
    ports::{AuditLog, AuditLogError, AuditLogResult},
};
use async_trait::async_trait;
use diesel::prelude::*;
use serde_json::Value;

/// Audit log writing to the `audit_entries` table.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: RegistryPgPool,
}

impl PostgresAuditLog {
    /// Creates a new audit log from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: RegistryPgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn append(&self, entry: &AuditEntry) -> AuditLogResult<()> {
        let row = NewAuditEntryRow {
            id: entry.id,
            action: entry.action.as_str().to_owned(),
            user_id: entry.user_id.as_str().to_owned(),
            server_id: entry.server_id.as_ref().map(|id| id.as_str().to_owned()),
            details: Value::Object(entry.details.clone()),
            recorded_at: entry.timestamp,
        };

        run_blocking(&self.pool, AuditLogError::write, move |connection| {
            diesel::insert_into(audit_entries::table)
                .values(&row)
                .execute(connection)
                .map_err(AuditLogError::write)?;
            Ok(())
        })
        .await
    }
}
