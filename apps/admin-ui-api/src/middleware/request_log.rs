// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request metadata and access logging.
//!
//! [`request_logger`] runs inside the request-id layers, so `x-request-id` is
//! always present by the time it reads it. The [`RequestMetadata`] it stores
//! in the request extensions is shared with the auth middleware, which
//! records the caller's user id for the response log line.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{
        header::USER_AGENT, request::Parts, Extensions, HeaderMap, HeaderName, Method,
    },
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Requests slower than this are logged as warnings.
const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(1000);

/// Logging context for one request.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub request_id: String,
    user_id: Arc<OnceLock<String>>,
    pub user_agent: Option<String>,
    pub ip: String,
    pub method: Method,
    pub url: String,
    pub started_at: Instant,
}

impl RequestMetadata {
    pub fn from_parts(headers: &HeaderMap, extensions: &Extensions, method: &Method, url: String) -> Self {
        let request_id = headers
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            request_id,
            user_id: Arc::new(OnceLock::new()),
            user_agent: headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            ip: client_ip(headers, extensions),
            method: method.clone(),
            url,
            started_at: Instant::now(),
        }
    }

    /// Authenticated user, once known.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.get().map(String::as_str)
    }

    /// Record the authenticated user. Later calls are ignored.
    pub fn set_user_id(&self, user_id: &str) {
        let _ = self.user_id.set(user_id.to_owned());
    }
}

/// Proxy headers first, then the socket peer.
fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::to_owned)
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Attach [`RequestMetadata`] and log the request and its outcome.
pub async fn request_logger(mut request: Request, next: Next) -> Response {
    let url = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let metadata = RequestMetadata::from_parts(
        request.headers(),
        request.extensions(),
        request.method(),
        url,
    );
    request.extensions_mut().insert(metadata.clone());

    info!(
        request_id = %metadata.request_id,
        method = %metadata.method,
        url = %metadata.url,
        ip = %metadata.ip,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = metadata.started_at.elapsed();
    let status = response.status().as_u16();
    let duration_ms = duration.as_millis() as u64;
    let user_id = metadata.user_id().unwrap_or("-");

    if status >= 400 {
        error!(
            request_id = %metadata.request_id,
            method = %metadata.method,
            url = %metadata.url,
            status,
            duration_ms,
            user_id,
            "Request completed"
        );
    } else {
        info!(
            request_id = %metadata.request_id,
            method = %metadata.method,
            url = %metadata.url,
            status,
            duration_ms,
            user_id,
            "Request completed"
        );
    }

    if duration > SLOW_REQUEST_THRESHOLD {
        warn!(
            request_id = %metadata.request_id,
            method = %metadata.method,
            url = %metadata.url,
            duration_ms,
            "Slow request detected"
        );
    }

    response
}

/// Request id of the current request, for response envelopes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestId(pub Option<String>);

impl RequestId {
    pub fn from_extensions(extensions: &Extensions, headers: &HeaderMap) -> Self {
        let id = extensions
            .get::<RequestMetadata>()
            .map(|m| m.request_id.clone())
            .or_else(|| {
                headers
                    .get(&REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned)
            });
        Self(id)
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_extensions(&parts.extensions, &parts.headers))
    }
}
