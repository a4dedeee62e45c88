//! Audit trail entries for catalog mutations.

use super::{Principal, ServerId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Mutation kinds recorded in the audit trail.
///
/// # Examples
///
/// ```rust
/// use mcp_registry::registry::domain::AuditAction;
///
/// assert_eq!(AuditAction::Publish.as_str(), "publish");
/// assert_eq!("delete".parse::<AuditAction>(), Ok(AuditAction::Delete));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A record was created or replaced.
    Publish,
    /// A record was partially updated.
    Update,
    /// A record was removed.
    Delete,
}

impl AuditAction {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown audit action.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown audit action: {0}")]
pub struct ParseAuditActionError(pub String);

impl FromStr for AuditAction {
    type Err = ParseAuditActionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "publish" => Ok(Self::Publish),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(ParseAuditActionError(other.to_owned())),
        }
    }
}

/// One append-only audit record.
///
/// Entries are never read back by the service. They exist for operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// Mutation kind.
    pub action: AuditAction,
    /// Principal that performed the mutation.
    pub user_id: Principal,
    /// Affected record, when one applies.
    pub server_id: Option<ServerId>,
    /// Time the entry was created.
    pub timestamp: DateTime<Utc>,
    /// Free-form context such as the updated field names.
    pub details: Map<String, Value>,
}

impl AuditEntry {
    /// Creates an entry stamped with the current time and a fresh identifier.
    #[must_use]
    pub fn new(
        action: AuditAction,
        user_id: Principal,
        server_id: Option<ServerId>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            user_id,
            server_id,
            timestamp: clock.utc(),
            details: Map::new(),
        }
    }

    /// Attaches one detail value.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}
