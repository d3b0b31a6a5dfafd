// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization middleware for Axum.
//!
//! `authenticate` and `optional_auth` take the shared [`TokenValidator`] as
//! state and attach the caller's [`Identity`] to the request extensions.
//! `authorize` and `require_role` only read that identity, so they must be
//! layered inside one of the former:
//!
//! ```rust,ignore
//! let routes = Router::new()
//!     .route("/auth/validate", post(validate))
//!     .route_layer(from_fn_with_state(RequiredPermissions::new(["token:validate"]), authorize))
//!     .route_layer(from_fn_with_state(validator, authenticate));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::error::AuthError;
use super::identity::Identity;
use super::validator::TokenValidator;
use crate::middleware::request_log::{RequestId, RequestMetadata};

/// Permissions that must all be held (AND).
#[derive(Debug, Clone)]
pub struct RequiredPermissions(Arc<[String]>);

impl RequiredPermissions {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(permissions.into_iter().map(Into::into).collect())
    }
}

/// Roles of which at least one must be held (OR).
#[derive(Debug, Clone)]
pub struct RequiredRoles(Arc<[String]>);

impl RequiredRoles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }
}

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}

fn reject(error: AuthError, request: &Request) -> Response {
    let request_id = RequestId::from_extensions(request.extensions(), request.headers());
    error
        .to_api_error()
        .with_request_id(request_id.into_inner())
        .into_response()
}

fn attach(request: &mut Request, identity: Identity) {
    if let Some(metadata) = request.extensions().get::<RequestMetadata>() {
        metadata.set_user_id(&identity.id);
    }
    request.extensions_mut().insert(identity);
}

/// Require a valid bearer token.
pub async fn authenticate(
    State(validator): State<Arc<TokenValidator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_owned(),
        Err(e) => {
            warn!(error_code = e.error_code(), path = %request.uri().path(), "Authentication failed");
            return reject(e, &request);
        }
    };

    match validator.validate(&token).await {
        Ok(identity) => {
            debug!(user_id = %identity.id, "Authenticated");
            attach(&mut request, identity);
            next.run(request).await
        }
        Err(e) => reject(e, &request),
    }
}

/// Attach an identity when a valid bearer token is present; never rejects.
pub async fn optional_auth(
    State(validator): State<Arc<TokenValidator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => Some(token.to_owned()),
        Err(AuthError::MissingAuthHeader) => None,
        Err(e) => {
            debug!(error_code = e.error_code(), "Ignoring unusable authorization header");
            None
        }
    };

    if let Some(token) = token {
        match validator.validate(&token).await {
            Ok(identity) => attach(&mut request, identity),
            Err(e) => debug!(error_code = e.error_code(), "Optional authentication failed"),
        }
    }

    next.run(request).await
}

/// Require every permission in [`RequiredPermissions`].
pub async fn authorize(
    State(required): State<RequiredPermissions>,
    request: Request,
    next: Next,
) -> Response {
    let Some(identity) = request.extensions().get::<Identity>() else {
        return reject(AuthError::Unauthenticated, &request);
    };

    if !identity.has_all_permissions(&required.0[..]) {
        warn!(
            user_id = %identity.id,
            required = ?required.0,
            held = ?identity.permissions,
            "Authorization failed: insufficient permissions"
        );
        return reject(AuthError::InsufficientPermissions, &request);
    }

    next.run(request).await
}

/// Require at least one role in [`RequiredRoles`].
pub async fn require_role(
    State(accepted): State<RequiredRoles>,
    request: Request,
    next: Next,
) -> Response {
    let Some(identity) = request.extensions().get::<Identity>() else {
        return reject(AuthError::Unauthenticated, &request);
    };

    if !identity.has_any_role(&accepted.0[..]) {
        warn!(
            user_id = %identity.id,
            accepted = ?accepted.0,
            held = ?identity.roles,
            "Authorization failed: insufficient role"
        );
        return reject(AuthError::InsufficientRole, &request);
    }

    next.run(request).await
}
