//! Mapping of service failures to HTTP responses.

use crate::registry::{
    ports::{AuthenticationError, ServerRepositoryError},
    services::RegistryServiceError,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Error returned by handlers, rendered as `{"error": message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A catalog operation failed.
    #[error(transparent)]
    Service(#[from] RegistryServiceError),

    /// The bearer credential was missing or invalid.
    #[error(transparent)]
    Unauthorized(#[from] AuthenticationError),

    /// The request could not be decoded.
    #[error("{0}")]
    BadRequest(String),

    /// The route is not available.
    #[error("{0}")]
    NotFound(String),

    /// An unexpected server-side failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Service(RegistryServiceError::Domain(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Service(RegistryServiceError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Service(RegistryServiceError::NotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Service(RegistryServiceError::Repository(
                ServerRepositoryError::Persistence(_) | ServerRepositoryError::Unsupported(_),
            )) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Service(RegistryServiceError::Repository(
                ServerRepositoryError::InvalidPersistedData(_),
            ))
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        } else if status == StatusCode::UNAUTHORIZED {
            warn!(error = %self, "request rejected");
        }

        let message = if status == StatusCode::SERVICE_UNAVAILABLE {
            "store unavailable".to_owned()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
