//! Service layer orchestrating catalog reads and owner-checked writes.

use super::{AuditRecorder, ForbiddenError, OwnershipGuard, SearchQueryBuilder};
use crate::registry::{
    domain::{
        AuditAction, AuditEntry, PageRequest, Principal, RegistryDomainError, SearchPage, ServerId,
        ServerPatch, ServerRecord, ServerSubmission, ServerTool, TextSearchSupport,
    },
    ports::{AuditLog, ServerRepository, ServerRepositoryError, UpsertOutcome},
};
use mockable::Clock;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Service-level errors for catalog operations.
#[derive(Debug, Error)]
pub enum RegistryServiceError {
    /// The payload or identifier failed domain validation.
    #[error(transparent)]
    Domain(#[from] RegistryDomainError),
    /// The caller may not perform this mutation.
    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),
    /// No record exists with the given identifier.
    #[error("server {0} not found")]
    NotFound(String),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ServerRepositoryError),
}

/// Result type for catalog service operations.
pub type RegistryServiceResult<T> = Result<T, RegistryServiceError>;

/// Tool listing for one catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerToolsView {
    /// Record identifier.
    pub server_id: ServerId,
    /// Record display name.
    pub server_name: String,
    /// Advertised tools in submission order.
    pub tools: Vec<ServerTool>,
}

/// Catalog orchestration service.
///
/// Writes run parse, ownership, schema, store, audit in that order. Reads
/// are unauthenticated.
pub struct RegistryService<R, A, C>
where
    R: ServerRepository + ?Sized,
    A: AuditLog + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    guard: OwnershipGuard,
    queries: SearchQueryBuilder,
    audit: AuditRecorder<A>,
    clock: Arc<C>,
}

impl<R, A, C> RegistryService<R, A, C>
where
    R: ServerRepository + ?Sized,
    A: AuditLog + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new catalog service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        audit_log: Arc<A>,
        guard: OwnershipGuard,
        queries: SearchQueryBuilder,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            guard,
            queries,
            audit: AuditRecorder::new(audit_log),
            clock,
        }
    }

    /// Publishes a record owned by `principal`, replacing any record with the
    /// same id that `principal` already owns.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Domain`] for malformed payloads or
    /// schema violations, [`RegistryServiceError::Forbidden`] for namespace
    /// violations or foreign records, and
    /// [`RegistryServiceError::Repository`] when persistence fails.
    pub async fn publish(
        &self,
        principal: &Principal,
        payload: Value,
    ) -> RegistryServiceResult<ServerRecord> {
        let submission = ServerSubmission::from_json(payload)?;
        self.guard
            .authorize_publish(principal, &submission.id, principal)?;

        let existing = self.repository.find_by_id(&submission.id).await?;
        if let Some(current) = existing.as_ref() {
            self.guard
                .authorize_mutation(principal, Some(current.owner()))?;
        }

        submission.validate_metadata()?;

        let mut record = ServerRecord::publish(submission, principal.clone(), &*self.clock);
        if let Some(current) = existing.as_ref() {
            record = record.replacing(current.created_at());
        }
        let replaced = match self.repository.upsert(&record).await? {
            UpsertOutcome::Inserted => false,
            UpsertOutcome::Replaced => true,
            UpsertOutcome::OwnerConflict => return Err(ForbiddenError::NotOwner.into()),
        };

        info!(
            user_id = %principal,
            server_id = %record.id(),
            replaced,
            "server published"
        );
        self.audit
            .record(
                AuditEntry::new(
                    AuditAction::Publish,
                    principal.clone(),
                    Some(record.id().clone()),
                    &*self.clock,
                )
                .with_detail("name", json!(record.name()))
                .with_detail("replaced", json!(replaced)),
            )
            .await;

        Ok(record)
    }

    /// Merges the fields in `payload` into a record owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Forbidden`] when the record is absent,
    /// unstorable or owned by someone else, [`RegistryServiceError::Domain`] for
    /// malformed patches, and [`RegistryServiceError::Repository`] when
    /// persistence fails.
    pub async fn update(
        &self,
        principal: &Principal,
        raw_id: &str,
        payload: Value,
    ) -> RegistryServiceResult<ServerRecord> {
        let server_id = stored_id(raw_id)?;
        self.authorize_existing(principal, &server_id).await?;

        let patch = ServerPatch::from_json(payload)?;
        let Some(record) = self
            .repository
            .merge(&server_id, &patch, ServerRecord::timestamp(&*self.clock))
            .await?
        else {
            return Err(ForbiddenError::NotOwner.into());
        };

        info!(
            user_id = %principal,
            server_id = %server_id,
            fields = ?patch.field_names(),
            "server updated"
        );
        self.audit
            .record(
                AuditEntry::new(
                    AuditAction::Update,
                    principal.clone(),
                    Some(server_id),
                    &*self.clock,
                )
                .with_detail("fields", json!(patch.field_names())),
            )
            .await;

        Ok(record)
    }

    /// Deletes a record owned by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Forbidden`] when the record is absent,
    /// unstorable or owned by someone else, and
    /// [`RegistryServiceError::Repository`] when persistence fails.
    pub async fn delete(&self, principal: &Principal, raw_id: &str) -> RegistryServiceResult<()> {
        let server_id = stored_id(raw_id)?;
        self.authorize_existing(principal, &server_id).await?;

        let removed = self.repository.delete(&server_id).await?;

        info!(user_id = %principal, server_id = %server_id, removed, "server deleted");
        self.audit
            .record(AuditEntry::new(
                AuditAction::Delete,
                principal.clone(),
                Some(server_id),
                &*self.clock,
            ))
            .await;

        Ok(())
    }

    /// Returns one record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::NotFound`] when absent, including for
    /// identifiers that could never be stored.
    pub async fn get(&self, server_id: &str) -> RegistryServiceResult<ServerRecord> {
        let not_found = || RegistryServiceError::NotFound(server_id.to_owned());
        let id = ServerId::new(server_id).map_err(|_| not_found())?;
        self.repository
            .find_by_id(&id)
            .await?
            .ok_or_else(not_found)
    }

    /// Returns the tool listing of one record.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::NotFound`] when absent.
    pub async fn tools(&self, server_id: &str) -> RegistryServiceResult<ServerToolsView> {
        let record = self.get(server_id).await?;
        Ok(ServerToolsView {
            server_id: record.id().clone(),
            server_name: record.name().to_owned(),
            tools: record.tools().to_vec(),
        })
    }

    /// Searches the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryServiceError::Repository`] when the store fails.
    pub async fn search(
        &self,
        text: Option<&str>,
        tool_names: &[String],
        page: PageRequest,
    ) -> RegistryServiceResult<SearchPage> {
        let query = self
            .queries
            .build_query(&*self.repository, text, tool_names)
            .await;
        Ok(self.repository.search(&query, page).await?)
    }

    /// Returns the resolved text-search capability.
    #[must_use]
    pub fn text_search_support(&self) -> TextSearchSupport {
        self.queries.probe().state()
    }

    /// Returns the number of failed audit writes since start-up.
    #[must_use]
    pub fn audit_failures(&self) -> u64 {
        self.audit.failures()
    }

    async fn authorize_existing(
        &self,
        principal: &Principal,
        server_id: &ServerId,
    ) -> RegistryServiceResult<()> {
        let existing = self.repository.find_by_id(server_id).await?;
        self.guard
            .authorize_mutation(principal, existing.as_ref().map(ServerRecord::owner))?;
        Ok(())
    }
}

/// Parses the id of a record a mutation targets. An id that could never be
/// stored names no record the caller owns.
fn stored_id(raw_id: &str) -> Result<ServerId, ForbiddenError> {
    ServerId::new(raw_id).map_err(|_| ForbiddenError::NotOwner)
}
