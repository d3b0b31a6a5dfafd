// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{Method, Uri},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        authenticate, authorize, optional_auth, require_role, AuthStatus, Identity,
        RequiredPermissions, RequiredRoles,
    },
    config::FeatureFlags,
    error::{ApiError, ErrorBody, ErrorCode, ErrorDetail},
    middleware::{self, request_log::RequestId},
    state::AppState,
};

pub mod auth;
pub mod config;
pub mod health;
pub mod response;

/// Mount point of every endpoint.
pub const API_PREFIX: &str = "/api/v1/admin-ui";

pub fn router(state: AppState) -> Router {
    let validator = state.validator.clone();

    let public = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/features", get(config::get_features))
        .route("/environment", get(config::get_environment));

    let client_config = Router::new()
        .route("/config", get(config::get_config))
        .route_layer(from_fn_with_state(validator.clone(), optional_auth));

    let me = Router::new()
        .route("/auth/me", get(auth::me))
        .route_layer(from_fn_with_state(validator.clone(), authenticate));

    let validate = Router::new()
        .route("/auth/validate", post(auth::validate_token))
        .route_layer(from_fn_with_state(
            RequiredPermissions::new([auth::VALIDATE_PERMISSION]),
            authorize,
        ))
        .route_layer(from_fn_with_state(validator.clone(), authenticate));

    let introspect = Router::new()
        .route("/auth/introspect", post(auth::introspect_token))
        .route_layer(from_fn_with_state(
            RequiredRoles::new([auth::INTROSPECT_ROLE]),
            require_role,
        ))
        .route_layer(from_fn_with_state(validator, authenticate));

    let admin_ui = public
        .merge(client_config)
        .merge(me)
        .merge(validate)
        .merge(introspect)
        .with_state(state.clone());

    let app = Router::new()
        .nest(API_PREFIX, admin_ui)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found);

    middleware::http::apply(app, &state.server.cors, state.server.limits)
}

async fn route_not_found(method: Method, uri: Uri, request_id: RequestId) -> ApiError {
    ApiError::not_found(format!("Route {method} {}", uri.path()))
        .with_request_id(request_id.into_inner())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::ready,
        config::get_config,
        config::get_features,
        config::get_environment,
        auth::me,
        auth::validate_token,
        auth::introspect_token
    ),
    components(
        schemas(
            ErrorBody,
            ErrorDetail,
            ErrorCode,
            Identity,
            AuthStatus,
            FeatureFlags,
            config::AppConfig,
            config::UiConfig,
            config::EnvironmentInfo,
            health::HealthResponse,
            health::ReadyResponse,
            auth::ValidateTokenRequest,
            auth::ValidateTokenResponse,
            auth::IntrospectTokenRequest,
            auth::IntrospectTokenResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Config", description = "Client configuration and feature flags"),
        (name = "Auth", description = "Bearer token helpers")
    )
)]
struct ApiDoc;
