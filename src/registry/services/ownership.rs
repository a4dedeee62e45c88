//! Namespace and owner checks for catalog mutations.

use crate::registry::domain::{Principal, ServerId};
use thiserror::Error;
use tracing::debug;

/// Namespace prefix accepted in strict mode.
pub const PRODUCTION_PREFIX: &str = "kp.internal.";

/// Namespace prefixes accepted in relaxed mode.
pub const RELAXED_PREFIXES: [&str; 3] = ["kp.internal.", "kp.public.", "kp.experimental."];

/// Publish policy applied by the [`OwnershipGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespacePolicy {
    /// Any listed prefix is accepted and the owner is not cross-checked.
    Relaxed {
        /// Accepted namespace prefixes.
        allowed_prefixes: Vec<String>,
    },
    /// Only the production prefix is accepted and the owner must be the
    /// caller.
    Strict {
        /// The single accepted namespace prefix.
        production_prefix: String,
    },
}

impl NamespacePolicy {
    /// Relaxed policy over [`RELAXED_PREFIXES`].
    #[must_use]
    pub fn relaxed() -> Self {
        Self::Relaxed {
            allowed_prefixes: RELAXED_PREFIXES.iter().map(|&prefix| prefix.to_owned()).collect(),
        }
    }

    /// Strict policy over [`PRODUCTION_PREFIX`].
    #[must_use]
    pub fn strict() -> Self {
        Self::Strict {
            production_prefix: PRODUCTION_PREFIX.to_owned(),
        }
    }
}

/// Authorization failures, all surfaced as 403.
///
/// A missing record and a record owned by someone else produce the same
/// [`ForbiddenError::NotOwner`] so callers cannot probe for existence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForbiddenError {
    /// The identifier is outside every accepted namespace.
    #[error("invalid namespace: server id must start with {expected}")]
    Namespace {
        /// Human-readable list of accepted prefixes.
        expected: String,
    },

    /// The proposed owner is not the caller.
    #[error("ownership mismatch")]
    OwnerMismatch,

    /// The caller does not own the target record, or it does not exist.
    #[error("forbidden: caller does not own this server")]
    NotOwner,
}

/// Enforces namespace and owner rules before any write reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipGuard {
    policy: NamespacePolicy,
}

impl OwnershipGuard {
    /// Creates a guard applying `policy` to publishes.
    #[must_use]
    pub const fn new(policy: NamespacePolicy) -> Self {
        Self { policy }
    }

    /// Returns the active publish policy.
    #[must_use]
    pub const fn policy(&self) -> &NamespacePolicy {
        &self.policy
    }

    /// Authorizes publishing `proposed_id` owned by `proposed_owner`.
    ///
    /// # Errors
    ///
    /// Returns [`ForbiddenError::Namespace`] for an unaccepted prefix and,
    /// in strict mode, [`ForbiddenError::OwnerMismatch`] when
    /// `proposed_owner` is not `principal`.
    pub fn authorize_publish(
        &self,
        principal: &Principal,
        proposed_id: &ServerId,
        proposed_owner: &Principal,
    ) -> Result<(), ForbiddenError> {
        match &self.policy {
            NamespacePolicy::Relaxed { allowed_prefixes } => {
                if allowed_prefixes
                    .iter()
                    .any(|prefix| proposed_id.has_namespace_prefix(prefix))
                {
                    return Ok(());
                }
                debug!(server_id = %proposed_id, "publish outside relaxed namespaces");
                Err(ForbiddenError::Namespace {
                    expected: allowed_prefixes.join(", "),
                })
            }
            NamespacePolicy::Strict { production_prefix } => {
                if !proposed_id.has_namespace_prefix(production_prefix) {
                    debug!(server_id = %proposed_id, "publish outside production namespace");
                    return Err(ForbiddenError::Namespace {
                        expected: production_prefix.clone(),
                    });
                }
                if proposed_owner != principal {
                    debug!(server_id = %proposed_id, "publish with foreign owner");
                    return Err(ForbiddenError::OwnerMismatch);
                }
                Ok(())
            }
        }
    }

    /// Authorizes updating or deleting a record whose owner is
    /// `existing_owner`, or `None` when the record is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ForbiddenError::NotOwner`] unless `principal` owns the
    /// record.
    pub fn authorize_mutation(
        &self,
        principal: &Principal,
        existing_owner: Option<&Principal>,
    ) -> Result<(), ForbiddenError> {
        match existing_owner {
            Some(owner) if owner == principal => Ok(()),
            _ => Err(ForbiddenError::NotOwner),
        }
    }
}
