//! Structural contract for the free-form server metadata document.
//!
//! Only the `metadata` document is checked. The normalized top-level fields
//! of a submission are decoded separately and are not cross-validated here.

use super::MetadataSchemaError;
use serde_json::{Map, Value};
use url::Url;

/// Validates a metadata document against the minimal server schema.
///
/// The schema requires a string `name` and a URI-valued `endpoint`.
/// Optional `description` and `version` must be strings, `tools` must be an
/// array of objects and `auth_methods` an array of strings. Every violation
/// is collected before returning.
///
/// # Errors
///
/// Returns [`MetadataSchemaError`] describing each violation. Several
/// violations are combined into [`MetadataSchemaError::Multiple`].
///
/// # Examples
///
/// ```rust
/// use mcp_registry::registry::domain::validate_metadata;
/// use serde_json::json;
///
/// let metadata = json!({"name": "GitHub", "endpoint": "https://mcp.example.com/github"});
/// assert!(validate_metadata(&metadata).is_ok());
/// assert!(validate_metadata(&json!({"name": "GitHub"})).is_err());
/// ```
pub fn validate_metadata(metadata: &Value) -> Result<(), MetadataSchemaError> {
    let Some(document) = metadata.as_object() else {
        return Err(MetadataSchemaError::NotAnObject);
    };

    let mut errors = Vec::new();
    collect(&mut errors, validate_required_string(document, "name"));
    collect(&mut errors, validate_endpoint(document));
    collect(&mut errors, validate_optional_string(document, "description"));
    collect(&mut errors, validate_optional_string(document, "version"));
    collect(&mut errors, validate_tools(document));
    collect(&mut errors, validate_auth_methods(document));

    MetadataSchemaError::from_violations(errors).map_or(Ok(()), Err)
}

fn collect(errors: &mut Vec<MetadataSchemaError>, result: Result<(), MetadataSchemaError>) {
    match result {
        Ok(()) => {}
        Err(MetadataSchemaError::Multiple(nested)) => errors.extend(nested),
        Err(error) => errors.push(error),
    }
}

fn validate_required_string(
    document: &Map<String, Value>,
    property: &'static str,
) -> Result<(), MetadataSchemaError> {
    match document.get(property) {
        None => Err(MetadataSchemaError::MissingProperty(property)),
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(MetadataSchemaError::WrongType {
            property,
            expected: "a string",
        }),
    }
}

fn validate_optional_string(
    document: &Map<String, Value>,
    property: &'static str,
) -> Result<(), MetadataSchemaError> {
    match document.get(property) {
        None | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(MetadataSchemaError::WrongType {
            property,
            expected: "a string",
        }),
    }
}

fn validate_endpoint(document: &Map<String, Value>) -> Result<(), MetadataSchemaError> {
    validate_required_string(document, "endpoint")?;
    let Some(endpoint) = document.get("endpoint").and_then(Value::as_str) else {
        return Err(MetadataSchemaError::MissingProperty("endpoint"));
    };

    Url::parse(endpoint)
        .map(|_| ())
        .map_err(|err| MetadataSchemaError::InvalidEndpoint {
            value: endpoint.to_owned(),
            reason: err.to_string(),
        })
}

fn validate_tools(document: &Map<String, Value>) -> Result<(), MetadataSchemaError> {
    validate_array_elements(document, "tools", "an object", Value::is_object)
}

fn validate_auth_methods(document: &Map<String, Value>) -> Result<(), MetadataSchemaError> {
    validate_array_elements(document, "auth_methods", "a string", Value::is_string)
}

fn validate_array_elements(
    document: &Map<String, Value>,
    property: &'static str,
    expected: &'static str,
    is_valid: fn(&Value) -> bool,
) -> Result<(), MetadataSchemaError> {
    let Some(value) = document.get(property) else {
        return Ok(());
    };

    let Some(elements) = value.as_array() else {
        return Err(MetadataSchemaError::WrongType {
            property,
            expected: "an array",
        });
    };

    let violations = elements
        .iter()
        .enumerate()
        .filter(|(_, element)| !is_valid(element))
        .map(|(index, _)| MetadataSchemaError::InvalidElement {
            property,
            index,
            expected,
        })
        .collect();

    MetadataSchemaError::from_violations(violations).map_or(Ok(()), Err)
}
