// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CORS policy for the admin UI.
//!
//! Credentials are always allowed, so a configured `*` is served by echoing
//! the caller's `Origin` instead of a literal wildcard. An empty allowlist
//! produces no CORS headers at all.

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::request_log::REQUEST_ID_HEADER;
use crate::config::CorsSettings;

/// Build the CORS layer for the given settings.
pub fn layer(settings: &CorsSettings) -> CorsLayer {
    let allow_origin = if settings.allows_any() {
        AllowOrigin::mirror_request()
    } else {
        let allowed: Vec<HeaderValue> = settings
            .origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();
        AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        })
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            REQUEST_ID_HEADER,
        ])
        .expose_headers([REQUEST_ID_HEADER])
        .allow_credentials(settings.allow_credentials)
        .max_age(settings.max_age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(origins: &[&str]) -> Router {
        let settings = CorsSettings {
            origins: origins.iter().map(|s| s.to_string()).collect(),
            allow_credentials: true,
            max_age: Duration::from_secs(86400),
        };
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(layer(&settings))
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/ping")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn allowlisted_origin_is_echoed_with_credentials() {
        let response = app(&["http://localhost:4200"])
            .oneshot(preflight("http://localhost:4200"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:4200"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }

    #[tokio::test]
    async fn unknown_origin_gets_no_allow_origin() {
        let response = app(&["http://localhost:4200"])
            .oneshot(preflight("https://evil.example.com"))
            .await
            .unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn wildcard_mirrors_request_origin() {
        let response = app(&["*"])
            .oneshot(preflight("https://anywhere.example.com"))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://anywhere.example.com"
        );
    }
}
