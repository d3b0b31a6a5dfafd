// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP-level middleware applied to every route.
//!
//! Outermost first:
//! - request id generation (`x-request-id`) and propagation to the response
//! - `TraceLayer` span per request
//! - CORS
//! - access logging with [`RequestMetadata`](super::request_log::RequestMetadata)
//! - body size limit and request timeout from [`RequestLimits`]

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::cors;
use super::request_log::{request_logger, REQUEST_ID_HEADER};
use crate::config::{CorsSettings, RequestLimits};

/// Apply HTTP-level middleware to the given Router.
pub fn apply(router: Router, cors_settings: &CorsSettings, limits: RequestLimits) -> Router {
    let layers = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TraceLayer::new_for_http())
        .layer(cors::layer(cors_settings))
        .layer(from_fn(request_logger))
        .layer(RequestBodyLimitLayer::new(limits.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            limits.timeout,
        ));

    router
        .layer(DefaultBodyLimit::max(limits.max_body_bytes))
        .layer(layers)
}
