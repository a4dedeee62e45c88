//! Repository port for catalog record persistence and search.

use crate::registry::domain::{
    PageRequest, SearchPage, ServerId, ServerPatch, ServerQuery, ServerRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for catalog repository operations.
pub type ServerRepositoryResult<T> = Result<T, ServerRepositoryError>;

/// Outcome of [`ServerRepository::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No record had this id.
    Inserted,
    /// A record with the same owner was replaced.
    Replaced,
    /// Another principal owns the stored record. Nothing was written.
    OwnerConflict,
}

/// Persistence contract for catalog records, keyed by [`ServerId`].
///
/// Authorization happens upstream. Only [`ServerRepository::upsert`]
/// checks ownership, atomically with the write.
#[async_trait]
pub trait ServerRepository: Send + Sync {
    /// Inserts the record, or replaces the whole document when the stored
    /// record has the same owner.
    ///
    /// The stored `created_at` of an existing record is kept.
    async fn upsert(&self, record: &ServerRecord) -> ServerRepositoryResult<UpsertOutcome>;

    /// Merges the fields set by `patch` into an existing record.
    ///
    /// `updated_at` is always written. Returns the merged record, or `None`
    /// when no record has this id.
    async fn merge(
        &self,
        server_id: &ServerId,
        patch: &ServerPatch,
        updated_at: DateTime<Utc>,
    ) -> ServerRepositoryResult<Option<ServerRecord>>;

    /// Removes a record. Returns whether a record was removed; removing an
    /// absent id is not an error.
    async fn delete(&self, server_id: &ServerId) -> ServerRepositoryResult<bool>;

    /// Finds a record by id.
    async fn find_by_id(
        &self,
        server_id: &ServerId,
    ) -> ServerRepositoryResult<Option<ServerRecord>>;

    /// Counts matching records, then fetches one page of them in insertion
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`ServerRepositoryError::Unsupported`] when the query asks
    /// for native text search and the store cannot answer it.
    async fn search(
        &self,
        query: &ServerQuery,
        page: PageRequest,
    ) -> ServerRepositoryResult<SearchPage>;

    /// Runs a trivial native text-search query.
    ///
    /// Any error means the capability is absent.
    async fn probe_text_search(&self) -> ServerRepositoryResult<()>;
}

/// Errors returned by catalog repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ServerRepositoryError {
    /// The store cannot evaluate the requested feature.
    #[error("unsupported store feature: {0}")]
    Unsupported(String),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted server data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ServerRepositoryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
