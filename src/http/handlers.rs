//! HTTP handlers for the catalog routes.

use super::{ApiError, AppState, AuthenticatedPrincipal, DevTokens};
use crate::registry::{
    domain::{PageRequest, ServerRecord},
    services::ServerToolsView,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

/// Query string accepted by the search route.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    tools: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

impl SearchParams {
    fn page(&self) -> Result<PageRequest, ApiError> {
        Ok(PageRequest::from_raw(
            parse_number("limit", self.limit.as_deref())?,
            parse_number("offset", self.offset.as_deref())?,
        ))
    }

    fn tool_names(&self) -> Vec<String> {
        self.tools
            .as_deref()
            .map(|tools| tools.split(',').map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("{name} must be an integer")))
        })
        .transpose()
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body)
        .map_err(|err| ApiError::BadRequest(format!("request body is not valid JSON: {err}")))
}

/// Search results page.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    servers: Vec<ServerRecord>,
    total: u64,
    offset: u64,
    limit: u32,
}

/// `GET /v0/servers`
pub async fn list_servers(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let page = params.page()?;
    let result = state
        .registry()
        .search(params.q.as_deref(), &params.tool_names(), page)
        .await?;

    Ok(Json(SearchResponse {
        servers: result.records,
        total: result.total,
        offset: result.page.offset(),
        limit: result.page.limit(),
    }))
}

/// `GET /v0/servers/{id}`
pub async fn get_server(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServerRecord>, ApiError> {
    Ok(Json(state.registry().get(&id).await?))
}

/// `GET /v0/servers/{id}/tools`
pub async fn get_server_tools(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ServerToolsView>, ApiError> {
    Ok(Json(state.registry().tools(&id).await?))
}

/// `POST /v0/servers`
pub async fn publish_server(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let record = state
        .registry()
        .publish(&principal, parse_body(&body)?)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": record.id(), "message": "Published" })),
    ))
}

/// `PUT /v0/servers/{id}`
pub async fn update_server(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    state
        .registry()
        .update(&principal, &id, parse_body(&body)?)
        .await?;
    Ok(Json(json!({ "message": "Updated" })))
}

/// `DELETE /v0/servers/{id}`
pub async fn delete_server(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.registry().delete(&principal, &id).await?;
    Ok(Json(json!({ "message": "Deleted" })))
}

/// Health report.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    dev_mode: bool,
    mock_user: Option<String>,
    text_search: &'static str,
    audit_write_failures: u64,
}

/// `GET /v0/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("health check");
    Json(HealthResponse {
        status: "healthy",
        dev_mode: state.is_dev_mode(),
        mock_user: state
            .dev_tokens
            .as_ref()
            .map(|dev| dev.user.as_str().to_owned()),
        text_search: state.registry().text_search_support().as_str(),
        audit_write_failures: state.registry().audit_failures(),
    })
}

fn dev_tokens(state: &AppState) -> Result<&DevTokens, ApiError> {
    state.dev_tokens.as_ref().ok_or_else(|| {
        ApiError::NotFound("development endpoints are not available in production mode".to_owned())
    })
}

/// `GET /dev/token`
pub async fn dev_token(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let dev = dev_tokens(&state)?;
    let token = dev
        .issuer
        .issue(&dev.user)
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(json!({
        "access_token": token.access_token,
        "user_email": dev.user,
        "expires_in": token.expires_in,
        "usage": "Send as 'Authorization: Bearer <access_token>'",
    })))
}

/// `POST /auth/token`
pub async fn auth_token(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let dev = dev_tokens(&state)?;
    let token = dev
        .issuer
        .issue(&dev.user)
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(json!({
        "access_token": token.access_token,
        "user_email": dev.user,
        "dev_mode": true,
        "message": "Mock token generated for development",
    })))
}

/// Fallback for unknown routes.
pub async fn route_not_found() -> ApiError {
    ApiError::NotFound("route not found".to_owned())
}
