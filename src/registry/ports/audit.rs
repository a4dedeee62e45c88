//! Append-only audit sink port.

use crate::registry::domain::AuditEntry;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for audit sink operations.
pub type AuditLogResult<T> = Result<T, AuditLogError>;

/// Append-only store of audit entries.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Appends one entry. Entries are never updated or removed.
    async fn append(&self, entry: &AuditEntry) -> AuditLogResult<()>;
}

/// Errors returned by audit sink implementations.
#[derive(Debug, Clone, Error)]
pub enum AuditLogError {
    /// The entry could not be written.
    #[error("audit write failed: {0}")]
    Write(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditLogError {
    /// Wraps a write failure.
    pub fn write(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Write(Arc::new(err))
    }
}
