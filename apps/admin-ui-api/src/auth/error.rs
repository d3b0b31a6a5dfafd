// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;

/// Every way a request can fail authentication or authorization.
///
/// The validator returns the precise cause. Clients only ever see the coarse
/// message from [`AuthError::client_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Header is not `Bearer <token>`
    InvalidAuthHeader,
    /// `OAUTH2_SERVICE_ENABLED` is off
    ServiceDisabled,
    /// A secret needed by the selected strategy is not set
    ConfigurationMissing(&'static str),
    /// Transport failure talking to the identity provider
    Network(String),
    /// Introspection endpoint returned an error or an unreadable body
    IntrospectionFailed(String),
    /// Introspection reported the token as not active
    TokenInactive,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token is not yet valid
    TokenNotYetValid,
    /// Token issuer is invalid
    InvalidIssuer,
    /// Token audience is invalid
    InvalidAudience,
    /// JWKS fetch failed
    JwksFetchError(String),
    /// No matching key in JWKS
    NoMatchingKey,
    /// Internal error
    InternalError(String),
    /// A gate ran without an authenticated identity
    Unauthenticated,
    /// Identity lacks a required permission
    InsufficientPermissions,
    /// Identity holds none of the accepted roles
    InsufficientRole,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::ServiceDisabled => "service_disabled",
            AuthError::ConfigurationMissing(_) => "configuration_missing",
            AuthError::Network(_) => "network_error",
            AuthError::IntrospectionFailed(_) => "introspection_failed",
            AuthError::TokenInactive => "token_inactive",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::InternalError(_) => "internal_error",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::InsufficientRole => "insufficient_role",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions | AuthError::InsufficientRole => {
                StatusCode::FORBIDDEN
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message shown to the client.
    pub fn client_message(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "No authorization header provided",
            AuthError::InvalidAuthHeader => "Invalid authorization header format",
            AuthError::Unauthenticated => "Authentication required",
            AuthError::InsufficientPermissions => "Insufficient permissions",
            AuthError::InsufficientRole => "Insufficient role privileges",
            _ => "Invalid or expired token",
        }
    }

    /// Client-facing envelope for this error.
    pub fn to_api_error(&self) -> ApiError {
        let message = self.client_message();
        if self.status_code() == StatusCode::FORBIDDEN {
            ApiError::forbidden(message)
        } else {
            ApiError::unauthorized(message)
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::ServiceDisabled => write!(f, "OAuth2 service is disabled"),
            AuthError::ConfigurationMissing(var) => write!(f, "{var} is not configured"),
            AuthError::Network(msg) => write!(f, "Identity provider unreachable: {msg}"),
            AuthError::IntrospectionFailed(msg) => write!(f, "Token introspection failed: {msg}"),
            AuthError::TokenInactive => write!(f, "Token is not active"),
            AuthError::MalformedToken => write!(f, "Token is malformed"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenNotYetValid => write!(f, "Token is not yet valid"),
            AuthError::InvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::InvalidAudience => write!(f, "Token audience is invalid"),
            AuthError::JwksFetchError(msg) => write!(f, "Failed to fetch JWKS: {msg}"),
            AuthError::NoMatchingKey => write!(f, "No matching key found in JWKS"),
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
            AuthError::Unauthenticated => write!(f, "Request is not authenticated"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::InsufficientRole => write!(f, "None of the required roles are held"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.to_api_error().into_response()
    }
}
