// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles identity (POST /v1/register, POST /v1/auth), the secret routes
//! under /v1/secrets, and the public GET /health.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use keeper_core::{
    CallMetadata, HealthStatus, KeeperError, NewSecret, SecretEntry, SecretUpdate, StatusKind,
};

use crate::server::GatewayState;

/// Request body for POST /v1/register and POST /v1/auth.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub login: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Response body carrying a freshly issued credential.
#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Request body for PUT /v1/secrets/{keyword}.
#[derive(Deserialize)]
pub struct ChangeRequest {
    pub payload: String,
    #[serde(default)]
    pub metadata: String,
}

/// Response body for GET /v1/secrets/{keyword}.
#[derive(Debug, Serialize, Deserialize)]
pub struct SecretsResponse {
    pub secrets: Vec<SecretEntry>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok", "degraded" or "unavailable".
    pub status: String,
    pub version: String,
    /// Storage backend name.
    pub storage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Generic error description; never names a login, keyword or cause.
    pub error: String,
    pub status: StatusKind,
    pub retryable: bool,
}

/// Handler error: a [`KeeperError`] rendered with its transport status.
#[derive(Debug)]
pub struct ApiError(pub KeeperError);

impl From<KeeperError> for ApiError {
    fn from(e: KeeperError) -> Self {
        Self(e)
    }
}

/// HTTP status for a vault status.
pub fn http_status(status: StatusKind) -> StatusCode {
    match status {
        StatusKind::AlreadyExists => StatusCode::CONFLICT,
        StatusKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        StatusKind::NotFound => StatusCode::NOT_FOUND,
        StatusKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status == StatusKind::Internal {
            tracing::error!(error = %self.0, kind = %self.0.kind(), "request failed");
        } else {
            tracing::debug!(error = %self.0, kind = %self.0.kind(), "request rejected");
        }
        let body = ErrorResponse {
            error: self.0.public_message().to_string(),
            status,
            retryable: self.0.is_retryable(),
        };
        (http_status(status), Json(body)).into_response()
    }
}

/// POST /v1/register
pub async fn post_register(
    State(state): State<GatewayState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let credential = state.service.register(&body.login, &body.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token: credential.0,
        }),
    ))
}

/// POST /v1/auth
pub async fn post_auth(
    State(state): State<GatewayState>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let credential = state
        .service
        .authenticate(&body.login, &body.password)
        .await?;
    Ok(Json(TokenResponse {
        token: credential.0,
    }))
}

/// POST /v1/secrets
pub async fn post_secret(
    State(state): State<GatewayState>,
    Extension(metadata): Extension<CallMetadata>,
    Json(body): Json<NewSecret>,
) -> Result<StatusCode, ApiError> {
    state.service.add(&metadata, body).await?;
    Ok(StatusCode::CREATED)
}

/// GET /v1/secrets/{keyword}
pub async fn get_secret(
    State(state): State<GatewayState>,
    Extension(metadata): Extension<CallMetadata>,
    Path(keyword): Path<String>,
) -> Result<Json<SecretsResponse>, ApiError> {
    let secrets = state.service.get(&metadata, &keyword).await?;
    Ok(Json(SecretsResponse { secrets }))
}

/// PUT /v1/secrets/{keyword}
pub async fn put_secret(
    State(state): State<GatewayState>,
    Extension(metadata): Extension<CallMetadata>,
    Path(keyword): Path<String>,
    Json(body): Json<ChangeRequest>,
) -> Result<StatusCode, ApiError> {
    let update = SecretUpdate {
        keyword,
        payload: body.payload,
        metadata: body.metadata,
    };
    state.service.change(&metadata, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/secrets/{keyword}
pub async fn delete_secret(
    State(state): State<GatewayState>,
    Extension(metadata): Extension<CallMetadata>,
    Path(keyword): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(&metadata, &keyword).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /health (public, no credential)
pub async fn get_health(State(state): State<GatewayState>) -> impl IntoResponse {
    let (code, status, detail) = match state.service.health().await {
        HealthStatus::Healthy => (StatusCode::OK, "ok", None),
        HealthStatus::Degraded(reason) => (StatusCode::OK, "degraded", Some(reason)),
        HealthStatus::Unhealthy(reason) => {
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable", Some(reason))
        }
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: state.service.store_name().to_string(),
            detail,
        }),
    )
}
