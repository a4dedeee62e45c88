//! Error types for registry domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryDomainError {
    /// The server identifier is empty after trimming.
    #[error("server id must not be empty")]
    EmptyServerId,

    /// The server identifier contains whitespace or control characters.
    #[error("server id '{0}' must not contain whitespace or control characters")]
    InvalidServerId(String),

    /// The server identifier exceeds the storage limit.
    #[error("server id exceeds 255 character limit: {0}")]
    ServerIdTooLong(String),

    /// The principal identity is empty after trimming.
    #[error("principal identity must not be empty")]
    EmptyPrincipal,

    /// The publish payload could not be decoded into a server submission.
    #[error("malformed server submission: {0}")]
    MalformedSubmission(String),

    /// The partial-update payload could not be decoded.
    #[error("malformed server update: {0}")]
    MalformedPatch(String),

    /// The submitted metadata document violates the server schema.
    #[error(transparent)]
    Schema(#[from] MetadataSchemaError),
}

/// Violations of the minimal server metadata schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetadataSchemaError {
    /// The metadata document is not a JSON object.
    #[error("metadata must be a JSON object")]
    NotAnObject,

    /// A required property is absent.
    #[error("metadata is missing required property '{0}'")]
    MissingProperty(&'static str),

    /// A property has the wrong JSON type.
    #[error("metadata property '{property}' must be {expected}")]
    WrongType {
        /// Property name.
        property: &'static str,
        /// Human-readable expected type.
        expected: &'static str,
    },

    /// The endpoint is not an absolute URI.
    #[error("metadata endpoint '{value}' is not a valid URI: {reason}")]
    InvalidEndpoint {
        /// Rejected endpoint value.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// An array element has the wrong shape.
    #[error("metadata property '{property}' element {index} must be {expected}")]
    InvalidElement {
        /// Array property name.
        property: &'static str,
        /// Offending element index.
        index: usize,
        /// Human-readable expected type.
        expected: &'static str,
    },

    /// Several violations were found.
    #[error("metadata schema violations: {}", format_violations(.0))]
    Multiple(Vec<Self>),
}

fn format_violations(errors: &[MetadataSchemaError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl MetadataSchemaError {
    /// Collapses collected violations into one error.
    ///
    /// Returns `None` when `errors` is empty and the single violation itself
    /// when only one was collected.
    #[must_use]
    pub fn from_violations(mut errors: Vec<Self>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}
