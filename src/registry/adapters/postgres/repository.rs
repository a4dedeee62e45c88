//! `PostgreSQL` repository implementation for catalog records.

use super::{
    blocking::{RegistryPgPool, run_blocking},
    models::{CountRow, NewServerRow, ServerRow, UpsertRow},
    schema::servers,
    search_sql::{FULL_TEXT_PREDICATE, SearchFilter},
};
use crate::registry::{
    domain::{PageRequest, SearchPage, ServerId, ServerPatch, ServerQuery, ServerRecord},
    ports::{ServerRepository, ServerRepositoryError, ServerRepositoryResult, UpsertOutcome},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{Jsonb, Text, Timestamptz, Varchar};
use serde_json::Value;

/// SQL for the catalog and audit tables.
pub const BASE_SCHEMA_SQL: &str =
    include_str!("../../../../migrations/2026-10-01-000000_create_servers_and_audit/up.sql");

/// SQL for the full-text index over the search document.
pub const TEXT_INDEX_SQL: &str =
    include_str!("../../../../migrations/2026-10-01-000001_add_server_text_index/up.sql");

/// Replaces the document only when the stored owner matches. `xmax` is zero
/// for freshly inserted tuples.
const UPSERT_SQL: &str = "INSERT INTO servers (server_id, document, created_at, updated_at) \
     VALUES ($1, $2, $3, $4) \
     ON CONFLICT (server_id) DO UPDATE \
     SET document = EXCLUDED.document, updated_at = EXCLUDED.updated_at \
     WHERE servers.document->>'owner' = EXCLUDED.document->>'owner' \
     RETURNING (xmax = 0) AS inserted";

/// Keys held in dedicated columns instead of the JSONB document.
const COLUMN_KEYS: [&str; 3] = ["id", "created_at", "updated_at"];

/// `PostgreSQL`-backed catalog repository storing records as JSONB.
#[derive(Debug, Clone)]
pub struct PostgresServerRepository {
    pool: RegistryPgPool,
}

impl PostgresServerRepository {
    /// Creates a new repository from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: RegistryPgPool) -> Self {
        Self { pool }
    }

    /// Creates the catalog and audit tables when they are absent.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRepositoryError::Persistence`] when the DDL fails.
    pub async fn apply_schema(&self) -> ServerRepositoryResult<()> {
        self.run_blocking(|connection| {
            connection
                .batch_execute(BASE_SCHEMA_SQL)
                .map_err(ServerRepositoryError::persistence)
        })
        .await
    }

    /// Creates the full-text index.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRepositoryError::Unsupported`] when the store rejects
    /// the index, as emulated `PostgreSQL` backends often do.
    pub async fn ensure_text_index(&self) -> ServerRepositoryResult<()> {
        self.run_blocking(|connection| {
            connection
                .batch_execute(TEXT_INDEX_SQL)
                .map_err(|err| ServerRepositoryError::Unsupported(err.to_string()))
        })
        .await
    }

    async fn run_blocking<F, T>(&self, operation: F) -> ServerRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ServerRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.pool, ServerRepositoryError::persistence, operation).await
    }
}

#[async_trait]
impl ServerRepository for PostgresServerRepository {
    async fn upsert(&self, record: &ServerRecord) -> ServerRepositoryResult<UpsertOutcome> {
        let new_row = to_new_row(record)?;

        self.run_blocking(move |connection| {
            let written = diesel::sql_query(UPSERT_SQL)
                .bind::<Varchar, _>(new_row.server_id)
                .bind::<Jsonb, _>(new_row.document)
                .bind::<Timestamptz, _>(new_row.created_at)
                .bind::<Timestamptz, _>(new_row.updated_at)
                .get_result::<UpsertRow>(connection)
                .optional()
                .map_err(ServerRepositoryError::persistence)?;
            Ok(match written {
                None => UpsertOutcome::OwnerConflict,
                Some(UpsertRow { inserted: true }) => UpsertOutcome::Inserted,
                Some(UpsertRow { inserted: false }) => UpsertOutcome::Replaced,
            })
        })
        .await
    }

    async fn merge(
        &self,
        server_id: &ServerId,
        patch: &ServerPatch,
        updated_at: DateTime<Utc>,
    ) -> ServerRepositoryResult<Option<ServerRecord>> {
        let key = server_id.as_str().to_owned();
        let fields = serde_json::to_value(patch).map_err(ServerRepositoryError::persistence)?;

        self.run_blocking(move |connection| {
            let row = diesel::sql_query(
                "UPDATE servers SET document = document || $1, updated_at = $2 \
                 WHERE server_id = $3 \
                 RETURNING server_id, document, created_at, updated_at",
            )
            .bind::<Jsonb, _>(fields)
            .bind::<Timestamptz, _>(updated_at)
            .bind::<Varchar, _>(key)
            .get_result::<ServerRow>(connection)
            .optional()
            .map_err(ServerRepositoryError::persistence)?;
            row.map(row_to_record).transpose()
        })
        .await
    }

    async fn delete(&self, server_id: &ServerId) -> ServerRepositoryResult<bool> {
        let key = server_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(servers::table.filter(servers::server_id.eq(key)))
                .execute(connection)
                .map_err(ServerRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn find_by_id(
        &self,
        server_id: &ServerId,
    ) -> ServerRepositoryResult<Option<ServerRecord>> {
        let key = server_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = servers::table
                .filter(servers::server_id.eq(key))
                .select(ServerRow::as_select())
                .first::<ServerRow>(connection)
                .optional()
                .map_err(ServerRepositoryError::persistence)?;
            row.map(row_to_record).transpose()
        })
        .await
    }

    async fn search(
        &self,
        query: &ServerQuery,
        page: PageRequest,
    ) -> ServerRepositoryResult<SearchPage> {
        let filter = SearchFilter::from_query(query);

        self.run_blocking(move |connection| {
            let count = filter
                .count_query()
                .get_result::<CountRow>(connection)
                .map_err(ServerRepositoryError::persistence)?;
            let rows = filter
                .page_query(page)
                .load::<ServerRow>(connection)
                .map_err(ServerRepositoryError::persistence)?;

            Ok(SearchPage {
                records: rows
                    .into_iter()
                    .map(row_to_record)
                    .collect::<ServerRepositoryResult<_>>()?,
                total: u64::try_from(count.total).unwrap_or_default(),
                page,
            })
        })
        .await
    }

    async fn probe_text_search(&self) -> ServerRepositoryResult<()> {
        self.run_blocking(|connection| {
            diesel::sql_query(format!(
                "SELECT COUNT(*) AS total FROM servers WHERE {FULL_TEXT_PREDICATE}"
            ))
            .bind::<Text, _>("probe")
            .get_result::<CountRow>(connection)
            .map(|_| ())
            .map_err(|err| ServerRepositoryError::Unsupported(err.to_string()))
        })
        .await
    }
}

fn to_new_row(record: &ServerRecord) -> ServerRepositoryResult<NewServerRow> {
    let Value::Object(mut document) =
        serde_json::to_value(record).map_err(ServerRepositoryError::persistence)?
    else {
        return Err(ServerRepositoryError::persistence(std::io::Error::other(
            "server record did not serialize to an object",
        )));
    };
    for key in COLUMN_KEYS {
        document.remove(key);
    }

    Ok(NewServerRow {
        server_id: record.id().as_str().to_owned(),
        document: Value::Object(document),
        created_at: record.created_at(),
        updated_at: record.updated_at(),
    })
}

fn row_to_record(row: ServerRow) -> ServerRepositoryResult<ServerRecord> {
    let Value::Object(mut document) = row.document else {
        return Err(ServerRepositoryError::invalid_persisted_data(
            std::io::Error::other(format!("document for '{}' is not an object", row.server_id)),
        ));
    };

    document.insert("id".to_owned(), Value::String(row.server_id));
    for (key, timestamp) in [("created_at", row.created_at), ("updated_at", row.updated_at)] {
        document.insert(
            key.to_owned(),
            serde_json::to_value(timestamp)
                .map_err(ServerRepositoryError::invalid_persisted_data)?,
        );
    }

    serde_json::from_value(Value::Object(document))
        .map_err(ServerRepositoryError::invalid_persisted_data)
}
