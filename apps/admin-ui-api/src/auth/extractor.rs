// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the identity attached by the auth middleware.
//!
//! ```rust,ignore
//! async fn me(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is Identity
//! }
//! ```
//!
//! The extractors never validate tokens themselves; routes using [`Auth`]
//! must sit behind [`authenticate`](super::middleware::authenticate).

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::error::AuthError;
use super::identity::Identity;
use crate::error::ApiError;
use crate::middleware::request_log::RequestId;

/// Authenticated caller. Rejects with 401 when no identity was attached.
pub struct Auth(pub Identity);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| {
                let request_id = RequestId::from_extensions(&parts.extensions, &parts.headers);
                AuthError::Unauthenticated
                    .to_api_error()
                    .with_request_id(request_id.into_inner())
            })
    }
}

/// Caller identity when one was attached by `optional_auth` or `authenticate`.
pub struct OptionalAuth(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<Identity>().cloned()))
    }
}
