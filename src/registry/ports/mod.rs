//! Port contracts for catalog persistence, auditing and identity.

mod audit;
mod identity;
mod repository;

pub use audit::{AuditLog, AuditLogError, AuditLogResult};
pub use identity::{AuthenticationError, Authenticator};
pub use repository::{
    ServerRepository, ServerRepositoryError, ServerRepositoryResult, UpsertOutcome,
};
