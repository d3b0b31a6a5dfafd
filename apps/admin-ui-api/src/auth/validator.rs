// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token validation.
//!
//! Strategy is chosen per call from the current environment:
//!
//! 1. Service disabled: every token is rejected without network access.
//! 2. Introspection enabled: the token is POSTed to the provider's
//!    introspection endpoint and accepted only if `active` is `true`.
//! 3. Otherwise the JWT is verified locally, first against the discovered
//!    JWKS and then, if that fails for any reason, with the HMAC shared
//!    secret. Both attempts require matching `iss` and `aud`.

use std::sync::Arc;

use base64ct::{Base64, Encoding};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::discovery::DiscoveryCache;
use super::error::AuthError;
use super::identity::{Identity, TokenClaims};
use super::jwks::KeySetProvider;
use crate::config::auth::{AuthConfig, AuthEndpoints};
use crate::config::env::{AppEnv, EnvSource};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Introspection endpoint response (RFC 7662).
#[derive(Debug, Deserialize)]
struct IntrospectionResponse {
    /// Anything other than JSON `true` means inactive.
    #[serde(default)]
    active: Option<serde_json::Value>,
    #[serde(flatten)]
    claims: TokenClaims,
}

/// Validation strategy selected by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Introspection,
    Local,
}

/// Snapshot of the validator for readiness reporting.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub enabled: bool,
    pub mode: AuthMode,
    pub issuer: String,
    pub discovery_cached: bool,
    pub jwks_cached: bool,
}

/// Validates bearer tokens and derives the caller's [`Identity`].
///
/// Holds the discovery and key set caches, so one instance should be shared
/// for the whole process.
pub struct TokenValidator {
    env: Arc<dyn EnvSource>,
    client: reqwest::Client,
    discovery: DiscoveryCache,
    key_sets: KeySetProvider,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("discovery", &self.discovery.cached().map(|_| "<cached>"))
            .field("key_set", &self.key_sets.cached().map(|k| k.url().to_string()))
            .finish_non_exhaustive()
    }
}

impl TokenValidator {
    /// Create a validator whose HTTP client uses the environment's auth timeout.
    pub fn new(env: Arc<dyn EnvSource>) -> Result<Self, reqwest::Error> {
        let endpoints = AuthEndpoints::for_env(AppEnv::from_env(env.as_ref()));
        let client = reqwest::Client::builder()
            .timeout(endpoints.timeout)
            .build()?;
        Ok(Self::with_client(env, client))
    }

    pub fn with_client(env: Arc<dyn EnvSource>, client: reqwest::Client) -> Self {
        Self {
            env,
            discovery: DiscoveryCache::new(client.clone()),
            key_sets: KeySetProvider::new(client.clone()),
            client,
        }
    }

    /// Auth settings as of now.
    pub fn config(&self) -> AuthConfig {
        AuthConfig::resolve(self.env.as_ref())
    }

    pub fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }

    pub fn discovery(&self) -> &DiscoveryCache {
        &self.discovery
    }

    pub fn key_sets(&self) -> &KeySetProvider {
        &self.key_sets
    }

    /// Validate a token and map its claims to an identity.
    pub async fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let config = self.config();
        let result = self.validate_with(token, &config).await;
        if let Err(e) = &result {
            warn!(error = %e, error_code = e.error_code(), "Token rejected");
        }
        result
    }

    async fn validate_with(&self, token: &str, config: &AuthConfig) -> Result<Identity, AuthError> {
        if !config.service_enabled {
            return Err(AuthError::ServiceDisabled);
        }

        if config.introspection_enabled {
            return self.introspect(token, config).await;
        }

        let secret = config
            .shared_secret
            .as_deref()
            .ok_or(AuthError::ConfigurationMissing("JWT_SECRET"))?;

        let claims = match self.verify_with_jwks(token, config).await {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "JWKS verification failed, trying shared secret");
                verify_with_secret(token, secret, config)?
            }
        };

        Ok(Identity::from_claims(claims, &config.client_id))
    }

    /// True only when introspection is configured and reports the token active.
    pub async fn introspect_token(&self, token: &str) -> bool {
        let config = self.config();
        if !config.service_enabled || !config.introspection_enabled {
            return false;
        }
        match self.introspect(token, &config).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Token introspection negative");
                false
            }
        }
    }

    async fn introspect(&self, token: &str, config: &AuthConfig) -> Result<Identity, AuthError> {
        let secret = config
            .client_secret
            .as_deref()
            .ok_or(AuthError::ConfigurationMissing("OAUTH2_CLIENT_SECRET"))?;
        let credentials =
            Base64::encode_string(format!("{}:{}", config.client_id, secret).as_bytes());

        let response = self
            .client
            .post(config.introspection_url())
            .header(AUTHORIZATION, format!("Basic {credentials}"))
            .form(&[("token", token), ("token_type_hint", "access_token")])
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::IntrospectionFailed(format!(
                "HTTP {status} from introspection endpoint"
            )));
        }

        let body: IntrospectionResponse = response
            .json()
            .await
            .map_err(|e| AuthError::IntrospectionFailed(e.to_string()))?;

        if body.active != Some(serde_json::Value::Bool(true)) {
            return Err(AuthError::TokenInactive);
        }

        Ok(Identity::from_claims(body.claims, &config.client_id))
    }

    async fn verify_with_jwks(
        &self,
        token: &str,
        config: &AuthConfig,
    ) -> Result<TokenClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        let discovery = self.discovery.get(config).await;
        let key_set = self.key_sets.get(&discovery, config).await?;

        if let Some(kid) = &header.kid {
            let (decoding_key, algorithm) = key_set.decoding_key(kid).await?;
            let data = decode::<TokenClaims>(token, &decoding_key, &validation(&[algorithm], config))
                .map_err(map_jwt_error)?;
            return Ok(data.claims);
        }

        // No `kid`: try every key of the header's algorithm until the
        // signature checks out. Claim errors after that are final.
        let validation = validation(&[header.alg], config);
        let mut last_error = AuthError::NoMatchingKey;
        for decoding_key in key_set.candidate_keys(header.alg).await? {
            match decode::<TokenClaims>(token, &decoding_key, &validation) {
                Ok(data) => return Ok(data.claims),
                Err(e) => match map_jwt_error(e) {
                    AuthError::InvalidSignature => last_error = AuthError::InvalidSignature,
                    other => return Err(other),
                },
            }
        }
        Err(last_error)
    }

    /// Current mode and cache state.
    pub async fn status(&self) -> AuthStatus {
        let config = self.config();
        let jwks_cached = match self.key_sets.cached() {
            Some(keys) => keys.is_cached().await,
            None => false,
        };
        AuthStatus {
            enabled: config.service_enabled,
            mode: if config.introspection_enabled {
                AuthMode::Introspection
            } else {
                AuthMode::Local
            },
            issuer: config.issuer,
            discovery_cached: self.discovery.cached().is_some(),
            jwks_cached,
        }
    }
}

fn verify_with_secret(
    token: &str,
    secret: &str,
    config: &AuthConfig,
) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<TokenClaims>(token, &key, &validation(&HMAC_ALGORITHMS, config))
        .map(|data| data.claims)
        .map_err(map_jwt_error)
}

/// Issuer and audience are mandatory. `exp` and `nbf` are checked when present.
fn validation(algorithms: &[Algorithm], config: &AuthConfig) -> Validation {
    let mut validation = Validation::new(algorithms[0]);
    validation.algorithms = algorithms.to_vec();
    validation.leeway = CLOCK_SKEW_LEEWAY;
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["iss", "aud"]);
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.client_id]);
    validation
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        ErrorKind::InvalidAudience => AuthError::InvalidAudience,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "iss" => AuthError::InvalidIssuer,
            "aud" => AuthError::InvalidAudience,
            _ => AuthError::MalformedToken,
        },
        _ => AuthError::MalformedToken,
    }
}
