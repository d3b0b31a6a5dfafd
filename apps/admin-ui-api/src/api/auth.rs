// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth helper endpoints.
//!
//! All of them sit behind `authenticate`; `/auth/validate` additionally
//! requires the `token:validate` permission and `/auth/introspect` the
//! `admin` role.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::response::ApiResponse;
use crate::auth::{Auth, Identity};
use crate::error::ApiError;
use crate::middleware::request_log::RequestId;
use crate::state::AppState;

/// Permission required for `/auth/validate`.
pub const VALIDATE_PERMISSION: &str = "token:validate";

/// Role required for `/auth/introspect`.
pub const INTROSPECT_ROLE: &str = "admin";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to validate a third-party token.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenRequest {
    #[serde(default)]
    pub token: String,
    /// Permissions the token's identity must all hold.
    #[serde(default)]
    pub require_permissions: Vec<String>,
}

/// Outcome of token validation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateTokenResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

/// Request to introspect a third-party token.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IntrospectTokenRequest {
    #[serde(default)]
    pub token: String,
}

/// Outcome of token introspection.
#[derive(Debug, Serialize, ToSchema)]
pub struct IntrospectTokenResponse {
    pub active: bool,
}

fn token_from<T>(
    payload: Result<Json<T>, JsonRejection>,
    field: impl Fn(&T) -> &str,
    request_id: &RequestId,
) -> Result<String, ApiError> {
    let Json(body) = payload
        .map_err(|e| ApiError::bad_request(e.body_text()).with_request_id(request_id.0.clone()))?;
    let token = field(&body).trim();
    if token.is_empty() {
        return Err(
            ApiError::validation([("token".to_string(), "Token is required".to_string())])
                .with_request_id(request_id.0.clone()),
        );
    }
    Ok(token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/v1/admin-ui/auth/me",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current identity", body = ApiResponse<Identity>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody)
    )
)]
pub async fn me(Auth(identity): Auth, request_id: RequestId) -> ApiResponse<Identity> {
    ApiResponse::ok(identity, request_id)
}

/// Validate a token on behalf of another component.
///
/// An unusable token is reported as `valid: false`, not as an error. When
/// `requirePermissions` is given the token is only valid if its identity
/// holds all of them.
#[utoipa::path(
    post,
    path = "/api/v1/admin-ui/auth/validate",
    tag = "Auth",
    security(("bearer_auth" = [])),
    request_body = ValidateTokenRequest,
    responses(
        (status = 200, description = "Validation outcome", body = ApiResponse<ValidateTokenResponse>),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
        (status = 403, description = "Missing token:validate permission", body = crate::error::ErrorBody),
        (status = 422, description = "Token missing", body = crate::error::ErrorBody)
    )
)]
pub async fn validate_token(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<ValidateTokenRequest>, JsonRejection>,
) -> Result<ApiResponse<ValidateTokenResponse>, ApiError> {
    let required = match &payload {
        Ok(Json(body)) => body.require_permissions.clone(),
        Err(_) => Vec::new(),
    };
    let token = token_from(payload, |b| b.token.as_str(), &request_id)?;

    let response = match state.validator.validate(&token).await {
        Ok(identity) => ValidateTokenResponse {
            valid: identity.has_all_permissions(&required),
            permissions: Some(identity.permissions.iter().cloned().collect()),
            user: Some(identity),
        },
        Err(_) => ValidateTokenResponse {
            valid: false,
            user: None,
            permissions: None,
        },
    };

    Ok(ApiResponse::ok(response, request_id))
}

/// Introspect a token against the identity provider.
///
/// `active` is false whenever introspection is not configured.
#[utoipa::path(
    post,
    path = "/api/v1/admin-ui/auth/introspect",
    tag = "Auth",
    security(("bearer_auth" = [])),
    request_body = IntrospectTokenRequest,
    responses(
        (status = 200, description = "Introspection outcome", body = ApiResponse<IntrospectTokenResponse>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
        (status = 403, description = "Admin role required", body = crate::error::ErrorBody)
    )
)]
pub async fn introspect_token(
    State(state): State<AppState>,
    request_id: RequestId,
    payload: Result<Json<IntrospectTokenRequest>, JsonRejection>,
) -> Result<ApiResponse<IntrospectTokenResponse>, ApiError> {
    let token = token_from(payload, |b| b.token.as_str(), &request_id)?;
    let active = state.validator.introspect_token(&token).await;
    Ok(ApiResponse::ok(IntrospectTokenResponse { active }, request_id))
}
