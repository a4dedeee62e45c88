//! Catalog server record aggregate root and its write payloads.

use super::{Principal, RegistryDomainError, ServerId, validate_metadata};
use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level keys a caller may never set through a partial update.
const PROTECTED_PATCH_KEYS: [&str; 4] = ["id", "owner", "created_at", "updated_at"];

/// Tool advertised by a catalog server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTool {
    name: String,
    description: String,
}

impl ServerTool {
    /// Creates a tool descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tool description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Publish payload accepted from an authenticated caller.
///
/// `owner`, `created_at` and `updated_at` are not part of the submission:
/// any such keys in the inbound document are ignored during decoding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerSubmission {
    /// Proposed namespace-prefixed identifier.
    pub id: ServerId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Server version string.
    pub version: String,
    /// Endpoint URI.
    pub endpoint: String,
    /// Advertised tools.
    pub tools: Vec<ServerTool>,
    /// Supported authentication scheme identifiers.
    pub auth_methods: Vec<String>,
    /// Organisational tag.
    pub team: String,
    /// Search labels.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Full original server document.
    pub metadata: Map<String, Value>,
    /// Visibility flag.
    #[serde(default)]
    pub is_public: bool,
}

impl ServerSubmission {
    /// Decodes a publish payload.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::MalformedSubmission`] when required
    /// fields are missing or have the wrong type.
    pub fn from_json(payload: Value) -> Result<Self, RegistryDomainError> {
        serde_json::from_value(payload)
            .map_err(|err| RegistryDomainError::MalformedSubmission(err.to_string()))
    }

    /// Checks the embedded metadata document against the server schema.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::Schema`] on schema violations.
    pub fn validate_metadata(&self) -> Result<(), RegistryDomainError> {
        validate_metadata(&Value::Object(self.metadata.clone()))?;
        Ok(())
    }
}

/// Partial update applied to an existing record.
///
/// Only fields present in the inbound document are set. Identity and
/// audit-controlled keys are stripped before decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerPatch {
    /// Replacement display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replacement description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Replacement endpoint URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Replacement tool list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ServerTool>>,
    /// Replacement authentication schemes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_methods: Option<Vec<String>>,
    /// Replacement organisational tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    /// Replacement search labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Replacement metadata document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    /// Replacement visibility flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl ServerPatch {
    /// Decodes a partial update, silently discarding protected keys.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError::MalformedPatch`] when the payload is not
    /// an object, names an unknown field or carries a wrongly typed value, and
    /// [`RegistryDomainError::Schema`] when a replacement `metadata` document
    /// violates the server schema.
    pub fn from_json(payload: Value) -> Result<Self, RegistryDomainError> {
        let Value::Object(mut fields) = payload else {
            return Err(RegistryDomainError::MalformedPatch(
                "update payload must be a JSON object".to_owned(),
            ));
        };

        for key in PROTECTED_PATCH_KEYS {
            fields.remove(key);
        }

        let patch: Self = serde_json::from_value(Value::Object(fields))
            .map_err(|err| RegistryDomainError::MalformedPatch(err.to_string()))?;

        if let Some(metadata) = patch.metadata.as_ref() {
            validate_metadata(&Value::Object(metadata.clone()))?;
        }

        Ok(patch)
    }

    /// Returns the names of the fields this patch sets, in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("description", self.description.is_some()),
            ("version", self.version.is_some()),
            ("endpoint", self.endpoint.is_some()),
            ("tools", self.tools.is_some()),
            ("auth_methods", self.auth_methods.is_some()),
            ("team", self.team.is_some()),
            ("tags", self.tags.is_some()),
            ("metadata", self.metadata.is_some()),
            ("is_public", self.is_public.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }

    /// Returns whether the patch sets no field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_names().is_empty()
    }
}

/// Catalog server record aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    id: ServerId,
    name: String,
    description: String,
    version: String,
    endpoint: String,
    tools: Vec<ServerTool>,
    auth_methods: Vec<String>,
    owner: Principal,
    team: String,
    #[serde(default)]
    tags: Vec<String>,
    metadata: Map<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    is_public: bool,
}

impl ServerRecord {
    /// Creates a record from a submission, owned by the publishing principal.
    ///
    /// Duplicate authentication schemes are collapsed, keeping first
    /// occurrence order.
    #[must_use]
    pub fn publish(submission: ServerSubmission, owner: Principal, clock: &impl Clock) -> Self {
        let timestamp = Self::timestamp(clock);
        let mut auth_methods: Vec<String> = Vec::with_capacity(submission.auth_methods.len());
        for method in submission.auth_methods {
            if !auth_methods.contains(&method) {
                auth_methods.push(method);
            }
        }

        Self {
            id: submission.id,
            name: submission.name,
            description: submission.description,
            version: submission.version,
            endpoint: submission.endpoint,
            tools: submission.tools,
            auth_methods,
            owner,
            team: submission.team,
            tags: submission.tags.unwrap_or_default(),
            metadata: submission.metadata,
            created_at: timestamp,
            updated_at: timestamp,
            is_public: submission.is_public,
        }
    }

    /// Reads `clock` at the microsecond precision records are stored with.
    #[must_use]
    pub fn timestamp(clock: &impl Clock) -> DateTime<Utc> {
        clock.utc().trunc_subsecs(6)
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> &ServerId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the endpoint URI.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the advertised tools in submission order.
    #[must_use]
    pub fn tools(&self) -> &[ServerTool] {
        &self.tools
    }

    /// Returns the supported authentication schemes.
    #[must_use]
    pub fn auth_methods(&self) -> &[String] {
        &self.auth_methods
    }

    /// Returns the owning principal.
    #[must_use]
    pub const fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Returns the organisational tag.
    #[must_use]
    pub fn team(&self) -> &str {
        &self.team
    }

    /// Returns the search labels.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the original metadata document.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the visibility flag.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.is_public
    }

    /// Returns whether any tool on this record carries one of `names`.
    #[must_use]
    pub fn offers_any_tool<'a>(&self, mut names: impl Iterator<Item = &'a String>) -> bool {
        names.any(|wanted| self.tools.iter().any(|tool| tool.name == *wanted))
    }

    /// Keeps the creation timestamp of the record this one replaces.
    #[must_use]
    pub fn replacing(mut self, previous_created_at: DateTime<Utc>) -> Self {
        self.created_at = previous_created_at;
        self
    }

    /// Merges the fields set by `patch` and refreshes `updated_at`.
    pub fn apply_patch(&mut self, patch: &ServerPatch, updated_at: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(version) = &patch.version {
            self.version.clone_from(version);
        }
        if let Some(endpoint) = &patch.endpoint {
            self.endpoint.clone_from(endpoint);
        }
        if let Some(tools) = &patch.tools {
            self.tools.clone_from(tools);
        }
        if let Some(auth_methods) = &patch.auth_methods {
            self.auth_methods.clone_from(auth_methods);
        }
        if let Some(team) = &patch.team {
            self.team.clone_from(team);
        }
        if let Some(tags) = &patch.tags {
            self.tags.clone_from(tags);
        }
        if let Some(metadata) = &patch.metadata {
            self.metadata.clone_from(metadata);
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        self.updated_at = updated_at;
    }
}
