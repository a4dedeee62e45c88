//! Application services for catalog ownership, search and auditing.

mod audit;
mod catalog;
mod ownership;
mod search;

pub use audit::AuditRecorder;
pub use catalog::{RegistryService, RegistryServiceError, RegistryServiceResult, ServerToolsView};
pub use ownership::{
    ForbiddenError, NamespacePolicy, OwnershipGuard, PRODUCTION_PREFIX, RELAXED_PREFIXES,
};
pub use search::{CapabilityProbe, SearchQueryBuilder};
