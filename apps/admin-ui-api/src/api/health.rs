// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthStatus;
use crate::error::now_rfc3339;
use crate::state::AppState;

/// Liveness probe response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Readiness probe response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    pub ready: bool,
    pub timestamp: String,
    pub checks: ReadyChecks,
}

/// Component status reported by the readiness probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyChecks {
    /// Token validation mode and cache state.
    pub auth: AuthStatus,
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/api/v1/admin-ui/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: now_rfc3339(),
    })
}

/// Readiness probe handler.
///
/// Does not contact the identity provider; auth state is reported from the
/// local caches only.
#[utoipa::path(
    get,
    path = "/api/v1/admin-ui/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse)
    )
)]
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: true,
        timestamp: now_rfc3339(),
        checks: ReadyChecks {
            auth: state.validator.status().await,
        },
    })
}
