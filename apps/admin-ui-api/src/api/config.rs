// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client configuration, feature flags and environment information.
//!
//! Everything here is read from the environment on each request.

use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use super::response::ApiResponse;
use crate::auth::OptionalAuth;
use crate::config::auth::AuthConfig;
use crate::config::env::AppEnv;
use crate::config::{api_url, FeatureFlags};
use crate::middleware::request_log::RequestId;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// UI colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Presentation defaults for the admin UI.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    pub theme: Theme,
    pub language: String,
    pub timezone: String,
    pub items_per_page: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            language: "en".to_string(),
            timezone: "UTC".to_string(),
            items_per_page: 20,
        }
    }
}

/// Bootstrap configuration for the admin UI.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub api_url: String,
    pub auth_issuer: String,
    pub auth_client_id: String,
    pub features: FeatureFlags,
    pub ui: UiConfig,
}

/// Deployment information.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub environment: String,
    /// Service version
    pub version: String,
    pub runtime: String,
    /// Operating system
    pub platform: String,
    pub api_url: String,
    pub auth_issuer: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get client configuration.
///
/// Authenticated callers get the dark theme.
#[utoipa::path(
    get,
    path = "/api/v1/admin-ui/config",
    tag = "Config",
    security((), ("bearer_auth" = [])),
    responses(
        (status = 200, description = "Client configuration", body = ApiResponse<AppConfig>)
    )
)]
pub async fn get_config(
    State(state): State<AppState>,
    OptionalAuth(identity): OptionalAuth,
    request_id: RequestId,
) -> ApiResponse<AppConfig> {
    let env = state.env();
    let auth = AuthConfig::resolve(env);

    let mut ui = UiConfig::default();
    if identity.is_some() {
        ui.theme = Theme::Dark;
    }

    let config = AppConfig {
        api_url: api_url(env),
        auth_issuer: auth.issuer,
        auth_client_id: auth.client_id,
        features: FeatureFlags::from_env(env),
        ui,
    };

    ApiResponse::ok(config, request_id).with_message("Configuration retrieved successfully")
}

/// Get feature flags.
///
/// Includes every `ENABLE_*` variable in addition to the well-known flags.
#[utoipa::path(
    get,
    path = "/api/v1/admin-ui/features",
    tag = "Config",
    responses(
        (status = 200, description = "Feature flags", body = ApiResponse<FeatureFlags>)
    )
)]
pub async fn get_features(
    State(state): State<AppState>,
    request_id: RequestId,
) -> ApiResponse<FeatureFlags> {
    ApiResponse::ok(FeatureFlags::full_from_env(state.env()), request_id)
}

/// Get environment information.
#[utoipa::path(
    get,
    path = "/api/v1/admin-ui/environment",
    tag = "Config",
    responses(
        (status = 200, description = "Environment information", body = ApiResponse<EnvironmentInfo>)
    )
)]
pub async fn get_environment(
    State(state): State<AppState>,
    request_id: RequestId,
) -> ApiResponse<EnvironmentInfo> {
    let env = state.env();
    let info = EnvironmentInfo {
        environment: AppEnv::from_env(env).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        runtime: "rust".to_string(),
        platform: std::env::consts::OS.to_string(),
        api_url: api_url(env),
        auth_issuer: AuthConfig::resolve(env).issuer,
    };
    ApiResponse::ok(info, request_id)
}
