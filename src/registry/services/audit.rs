//! Fire-and-forget write path for the audit trail.

use crate::registry::{domain::AuditEntry, ports::AuditLog};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Appends audit entries without ever failing the calling mutation.
///
/// Write failures are logged and counted. The count is exposed for health
/// reporting.
pub struct AuditRecorder<A: AuditLog + ?Sized> {
    log: Arc<A>,
    failures: AtomicU64,
}

impl<A: AuditLog + ?Sized> AuditRecorder<A> {
    /// Creates a recorder writing to `log`.
    #[must_use]
    pub const fn new(log: Arc<A>) -> Self {
        Self {
            log,
            failures: AtomicU64::new(0),
        }
    }

    /// Appends `entry`, swallowing and counting any failure.
    pub async fn record(&self, entry: AuditEntry) {
        if let Err(err) = self.log.append(&entry).await {
            let total = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                error = %err,
                action = %entry.action,
                user_id = %entry.user_id,
                server_id = entry.server_id.as_ref().map(|id| id.as_str()),
                audit_failures = total,
                "audit write failed; mutation kept"
            );
        }
    }

    /// Returns the number of failed audit writes since start-up.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
