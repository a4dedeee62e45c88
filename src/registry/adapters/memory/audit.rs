//! In-memory append-only audit log.

use crate::registry::{
    domain::AuditEntry,
    ports::{AuditLog, AuditLogError, AuditLogResult},
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory audit log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every appended entry in append order.
    ///
    /// A poisoned lock yields an empty snapshot.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: &AuditEntry) -> AuditLogResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| AuditLogError::write(std::io::Error::other(err.to_string())))?;
        entries.push(entry.clone());
        Ok(())
    }
}
