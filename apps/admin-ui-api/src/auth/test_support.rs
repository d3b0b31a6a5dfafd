// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mock identity provider and token minting for auth tests.

use std::sync::Arc;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::validator::TokenValidator;
use crate::config::auth::AuthConfig;
use crate::config::env::{EnvSource, StaticEnv};

pub const SHARED_SECRET: &str = "test-shared-secret-with-enough-entropy";
pub const TEST_KID: &str = "test-key";

const RSA_PRIVATE_PEM: &[u8] = include_bytes!("testdata/rsa_private.pem");
const JWKS_JSON: &str = include_str!("testdata/jwks.json");
/// `next-key` first, then the fixture `test-key`.
const ROTATED_JWKS_JSON: &str = include_str!("testdata/jwks_rotated.json");

const ISSUER_PATH: &str = "/api/v1/auth";

/// Wiremock-backed OAuth2 provider.
pub struct MockIdentityProvider {
    pub server: MockServer,
}

impl MockIdentityProvider {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn issuer(&self) -> String {
        format!("{}{ISSUER_PATH}", self.server.uri())
    }

    pub fn jwks_url(&self) -> String {
        format!("{}{ISSUER_PATH}/keys", self.server.uri())
    }

    pub async fn mount_discovery(&self, expect: u64) {
        let body = json!({
            "issuer": self.issuer(),
            "jwks_uri": self.jwks_url(),
            "introspection_endpoint": format!("{}/oauth2/introspect", self.issuer()),
        });
        self.mount_discovery_body(body, expect).await;
    }

    pub async fn mount_discovery_body(&self, body: Value, expect: u64) {
        Mock::given(method("GET"))
            .and(path(format!("{ISSUER_PATH}/.well-known/oauth-authorization-server")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expect)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_discovery_failure(&self, status: u16, expect: u64) {
        Mock::given(method("GET"))
            .and(path(format!("{ISSUER_PATH}/.well-known/oauth-authorization-server")))
            .respond_with(ResponseTemplate::new(status))
            .expect(expect)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_jwks(&self, expect: u64) {
        self.mount_jwks_body(JWKS_JSON, expect).await;
    }

    /// JWKS mid-rotation: the fixture signing key is not the first entry.
    pub async fn mount_rotated_jwks(&self, expect: u64) {
        self.mount_jwks_body(ROTATED_JWKS_JSON, expect).await;
    }

    async fn mount_jwks_body(&self, body: &str, expect: u64) {
        let jwks: Value = serde_json::from_str(body).unwrap();
        Mock::given(method("GET"))
            .and(path(format!("{ISSUER_PATH}/keys")))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks))
            .expect(expect)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_jwks_failure(&self, status: u16) {
        for jwks_path in [
            format!("{ISSUER_PATH}/keys"),
            format!("{ISSUER_PATH}/.well-known/jwks.json"),
        ] {
            Mock::given(method("GET"))
                .and(path(jwks_path))
                .respond_with(ResponseTemplate::new(status))
                .mount(&self.server)
                .await;
        }
    }

    pub async fn mount_introspection(&self, body: Value, expect: u64) {
        Mock::given(method("POST"))
            .and(path(format!("{ISSUER_PATH}/oauth2/introspect")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expect)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_introspection_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(format!("{ISSUER_PATH}/oauth2/introspect")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }
}

/// `env` with `AUTH_ISSUER` pointed at the mock provider unless already set.
pub fn provider_env(idp: &MockIdentityProvider, env: StaticEnv) -> StaticEnv {
    if env.var("AUTH_ISSUER").is_some() {
        env
    } else {
        env.with("AUTH_ISSUER", idp.issuer())
    }
}

pub fn auth_config(idp: &MockIdentityProvider, env: StaticEnv) -> AuthConfig {
    AuthConfig::resolve(&provider_env(idp, env))
}

pub fn validator_for(idp: &MockIdentityProvider, env: StaticEnv) -> TokenValidator {
    TokenValidator::with_client(Arc::new(provider_env(idp, env)), reqwest::Client::new())
}

/// Registered claims valid for the next hour.
pub fn claims_for(issuer: &str, audience: &str, subject: &str) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "sub": subject,
        "iss": issuer,
        "aud": audience,
        "iat": now,
        "nbf": now,
        "exp": now + 3600,
    })
}

pub fn hs256_token(claims: &Value) -> String {
    let key = EncodingKey::from_secret(SHARED_SECRET.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key).unwrap()
}

pub fn rs256_token(claims: &Value) -> String {
    rs256_token_with_kid(claims, Some(TEST_KID))
}

pub fn rs256_token_with_kid(claims: &Value, kid: Option<&str>) -> String {
    let key = EncodingKey::from_rsa_pem(RSA_PRIVATE_PEM).unwrap();
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    encode(&header, claims, &key).unwrap()
}
