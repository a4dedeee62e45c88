//! In-process adapters for tests and single-node development.

mod audit;
mod matching;
mod repository;

pub use audit::InMemoryAuditLog;
pub use repository::InMemoryServerRepository;
