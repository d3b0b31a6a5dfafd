// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth2 settings.
//!
//! Endpoint paths are fixed per deployment environment. Secrets, the client
//! id and the feature switches come from the environment and are re-read on
//! every call to [`AuthConfig::resolve`].

use std::time::Duration;

use super::env::{env_bool, env_var, AppEnv, EnvSource};

/// Default OAuth2 client id of the admin UI.
pub const DEFAULT_CLIENT_ID: &str = "admin-ui-client";

/// OAuth2 provider endpoints for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub issuer: &'static str,
    pub scope: &'static [&'static str],
    pub response_type: &'static str,
    pub redirect_uri: &'static str,
    pub logout_redirect_uri: &'static str,
    pub authorization_endpoint: &'static str,
    pub token_endpoint: &'static str,
    pub introspection_endpoint: &'static str,
    pub revocation_endpoint: &'static str,
    pub userinfo_endpoint: &'static str,
    pub discovery_endpoint: &'static str,
    pub timeout: Duration,
}

const SCOPE: &[&str] = &["openid", "profile", "email", "admin"];

const DEVELOPMENT: AuthEndpoints = AuthEndpoints {
    issuer: "http://localhost:8080/api/v1/auth",
    scope: SCOPE,
    response_type: "code",
    redirect_uri: "http://localhost:4000/auth/callback",
    logout_redirect_uri: "http://localhost:4000/auth/logout",
    authorization_endpoint: "/oauth2/authorize",
    token_endpoint: "/oauth2/token",
    introspection_endpoint: "/oauth2/introspect",
    revocation_endpoint: "/oauth2/revoke",
    userinfo_endpoint: "/oauth2/userinfo",
    discovery_endpoint: "/.well-known/oauth-authorization-server",
    timeout: Duration::from_secs(30),
};

const STAGING: AuthEndpoints = AuthEndpoints {
    issuer: "https://staging-auth.recipe-app.com/api/v1/auth",
    redirect_uri: "https://staging-admin.recipe-app.com/auth/callback",
    logout_redirect_uri: "https://staging-admin.recipe-app.com/auth/logout",
    ..DEVELOPMENT
};

const PRODUCTION: AuthEndpoints = AuthEndpoints {
    issuer: "https://sous-chef-proxy.local/api/v1/auth",
    redirect_uri: "https://admin.recipe-app.com/auth/callback",
    logout_redirect_uri: "https://admin.recipe-app.com/auth/logout",
    ..DEVELOPMENT
};

impl AuthEndpoints {
    pub fn for_env(env: AppEnv) -> &'static AuthEndpoints {
        match env {
            AppEnv::Staging => &STAGING,
            AppEnv::Production => &PRODUCTION,
            AppEnv::Development | AppEnv::Test => &DEVELOPMENT,
        }
    }
}

/// Auth settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub environment: AppEnv,
    pub issuer: String,
    pub client_id: String,
    /// Used for HTTP Basic auth against the introspection endpoint.
    pub client_secret: Option<String>,
    /// HMAC key for locally signed tokens.
    pub shared_secret: Option<String>,
    pub service_enabled: bool,
    pub introspection_enabled: bool,
    pub service_to_service_enabled: bool,
    pub endpoints: &'static AuthEndpoints,
}

impl AuthConfig {
    /// Resolve the current settings.
    ///
    /// Never fails. When the service is enabled, a missing secret for the
    /// active mode is logged here and rejected later by the validation path.
    pub fn resolve(src: &dyn EnvSource) -> Self {
        let environment = AppEnv::from_env(src);
        let endpoints = AuthEndpoints::for_env(environment);

        let issuer = env_var(src, "AUTH_ISSUER", Some(endpoints.issuer))
            .unwrap_or_else(|| endpoints.issuer.to_string())
            .trim_end_matches('/')
            .to_string();
        let client_id = env_var(src, "OAUTH2_CLIENT_ID", Some(DEFAULT_CLIENT_ID))
            .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string());

        let service_enabled = env_bool(src, "OAUTH2_SERVICE_ENABLED", false);
        let introspection_enabled = env_bool(src, "OAUTH2_INTROSPECTION_ENABLED", false);

        let client_secret = env_var(src, "OAUTH2_CLIENT_SECRET", None);
        if service_enabled && introspection_enabled && client_secret.is_none() {
            tracing::warn!("OAUTH2_CLIENT_SECRET not configured - introspection will fail");
        }
        let shared_secret = env_var(src, "JWT_SECRET", None);
        if service_enabled && !introspection_enabled && shared_secret.is_none() {
            tracing::warn!("JWT_SECRET not configured - local JWT validation will fail");
        }

        Self {
            environment,
            issuer,
            client_id,
            client_secret,
            shared_secret,
            service_enabled,
            introspection_enabled,
            service_to_service_enabled: env_bool(src, "OAUTH2_SERVICE_TO_SERVICE_ENABLED", false),
            endpoints,
        }
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.issuer, path)
    }

    pub fn authorization_url(&self) -> String {
        self.endpoint_url(self.endpoints.authorization_endpoint)
    }

    pub fn token_url(&self) -> String {
        self.endpoint_url(self.endpoints.token_endpoint)
    }

    pub fn introspection_url(&self) -> String {
        self.endpoint_url(self.endpoints.introspection_endpoint)
    }

    pub fn revocation_url(&self) -> String {
        self.endpoint_url(self.endpoints.revocation_endpoint)
    }

    pub fn userinfo_url(&self) -> String {
        self.endpoint_url(self.endpoints.userinfo_endpoint)
    }

    pub fn discovery_url(&self) -> String {
        self.endpoint_url(self.endpoints.discovery_endpoint)
    }

    /// JWKS location used when discovery is unavailable.
    pub fn default_jwks_url(&self) -> String {
        self.endpoint_url("/.well-known/jwks.json")
    }
}
