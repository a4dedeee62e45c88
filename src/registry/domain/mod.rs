//! Domain model for the MCP server catalog.
//!
//! The registry domain models server records, their identifiers and owners,
//! the metadata schema, search predicates and audit entries. Storage and
//! transport concerns remain outside this boundary.

mod audit;
mod capability;
mod error;
mod ids;
mod metadata;
mod query;
mod server;

pub use audit::{AuditAction, AuditEntry, ParseAuditActionError};
pub use capability::TextSearchSupport;
pub use error::{MetadataSchemaError, RegistryDomainError};
pub use ids::{Principal, ServerId};
pub use metadata::validate_metadata;
pub use query::{
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, PageRequest, SEARCHABLE_FIELDS, SearchPage, ServerQuery,
    TextMatch,
};
pub use server::{ServerPatch, ServerRecord, ServerSubmission, ServerTool};
