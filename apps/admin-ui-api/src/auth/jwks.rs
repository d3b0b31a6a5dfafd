// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! [`KeySetProvider`] builds one [`RemoteKeySet`] from the discovered
//! `jwks_uri` and keeps it for the process lifetime. The key set itself
//! caches the fetched JWKS with a TTL and refetches early when a token names
//! a `kid` it has not seen, at most once per cool-down period.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, AlgorithmFamily, DecodingKey};
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info};
use url::Url;

use super::discovery::DiscoveryDocument;
use super::error::AuthError;
use crate::config::auth::AuthConfig;

/// Default JWKS cache TTL (5 minutes).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Minimum gap between refreshes forced by an unknown `kid`.
const FORCED_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Remote key set bound to one JWKS URL.
pub struct RemoteKeySet {
    url: Url,
    cache_ttl: Duration,
    cache: RwLock<Option<CacheEntry>>,
    last_forced_refresh: Mutex<Option<Instant>>,
    client: reqwest::Client,
}

impl std::fmt::Debug for RemoteKeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteKeySet")
            .field("url", &self.url.as_str())
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

impl RemoteKeySet {
    pub fn new(url: Url, client: reqwest::Client) -> Self {
        Self {
            url,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: RwLock::new(None),
            last_forced_refresh: Mutex::new(None),
            client,
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch JWKS (with caching).
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        let jwks = self.fetch_jwks().await?;
        self.store(jwks.clone()).await;
        Ok(jwks)
    }

    async fn store(&self, jwks: JwkSet) {
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        debug!(jwks_url = %self.url, "Fetching JWKS");
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::JwksFetchError(e.to_string()))
    }

    /// Get a decoding key for the given key ID.
    ///
    /// An unknown `kid` triggers one early refetch unless another forced
    /// refetch happened within the cool-down window.
    pub async fn decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = self.get_jwks().await?;
        if let Some(jwk) = jwks.find(kid) {
            return jwk_to_decoding_key(jwk);
        }

        if !self.claim_forced_refresh().await {
            return Err(AuthError::NoMatchingKey);
        }

        info!(kid, jwks_url = %self.url, "Unknown key id, refreshing JWKS");
        self.refresh().await?;
        let jwks = self.get_jwks().await?;
        let jwk = jwks.find(kid).ok_or(AuthError::NoMatchingKey)?;
        jwk_to_decoding_key(jwk)
    }

    /// Every key in the set usable with `alg`, in JWKS order.
    ///
    /// Used for tokens without a `kid`. Keys of another family, or whose
    /// declared `alg` differs, are skipped.
    pub async fn candidate_keys(&self, alg: Algorithm) -> Result<Vec<DecodingKey>, AuthError> {
        let jwks = self.get_jwks().await?;

        let keys: Vec<DecodingKey> = jwks
            .keys
            .iter()
            .filter(|jwk| accepts_algorithm(jwk, alg))
            .filter_map(|jwk| jwk_to_decoding_key(jwk).ok())
            .map(|(key, _)| key)
            .collect();

        if keys.is_empty() {
            return Err(AuthError::NoMatchingKey);
        }
        Ok(keys)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let jwks = self.fetch_jwks().await?;
        self.store(jwks).await;
        Ok(())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        if let Some(entry) = &*cache {
            entry.fetched_at.elapsed() < self.cache_ttl
        } else {
            false
        }
    }

    async fn claim_forced_refresh(&self) -> bool {
        let mut last = self.last_forced_refresh.lock().await;
        match *last {
            Some(at) if at.elapsed() < FORCED_REFRESH_COOLDOWN => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}

fn accepts_algorithm(jwk: &Jwk, alg: Algorithm) -> bool {
    let family = match &jwk.algorithm {
        AlgorithmParameters::RSA(_) => AlgorithmFamily::Rsa,
        AlgorithmParameters::EllipticCurve(_) => AlgorithmFamily::Ec,
        _ => return false,
    };
    if family != alg.family() {
        return false;
    }
    match jwk.common.key_algorithm {
        Some(declared) => declared.to_string().parse::<Algorithm>().is_ok_and(|a| a == alg),
        None => true,
    }
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| AuthError::InternalError(format!("Failed to create RSA key: {e}")))?;

            let alg = jwk
                .common
                .key_algorithm
                .map(|a| match a {
                    KeyAlgorithm::RS384 => Algorithm::RS384,
                    KeyAlgorithm::RS512 => Algorithm::RS512,
                    KeyAlgorithm::PS256 => Algorithm::PS256,
                    KeyAlgorithm::PS384 => Algorithm::PS384,
                    KeyAlgorithm::PS512 => Algorithm::PS512,
                    _ => Algorithm::RS256,
                })
                .unwrap_or(Algorithm::RS256);

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| AuthError::InternalError(format!("Failed to create EC key: {e}")))?;

            let alg = jwk
                .common
                .key_algorithm
                .map(|a| match a {
                    KeyAlgorithm::ES384 => Algorithm::ES384,
                    _ => Algorithm::ES256,
                })
                .unwrap_or(Algorithm::ES256);

            Ok((key, alg))
        }
        _ => Err(AuthError::InternalError(
            "Unsupported key type in JWKS".to_string(),
        )),
    }
}

/// Lazily built, process-wide [`RemoteKeySet`].
#[derive(Debug)]
pub struct KeySetProvider {
    client: reqwest::Client,
    key_set: OnceCell<Arc<RemoteKeySet>>,
}

impl KeySetProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            key_set: OnceCell::new(),
        }
    }

    /// Key set for the discovered `jwks_uri`, resolved against the issuer.
    ///
    /// Only a successful construction is memoized.
    pub async fn get(
        &self,
        discovery: &DiscoveryDocument,
        config: &AuthConfig,
    ) -> Result<Arc<RemoteKeySet>, AuthError> {
        self.key_set
            .get_or_try_init(|| async {
                let url = jwks_url(&config.issuer, &discovery.jwks_uri)?;
                info!(jwks_url = %url, "Using remote JWKS");
                Ok(Arc::new(RemoteKeySet::new(url, self.client.clone())))
            })
            .await
            .cloned()
    }

    /// Key set, if one has been built.
    pub fn cached(&self) -> Option<Arc<RemoteKeySet>> {
        self.key_set.get().cloned()
    }
}

/// Resolve `jwks_uri` against the issuer. Absolute URIs are used as-is.
pub fn jwks_url(issuer: &str, jwks_uri: &str) -> Result<Url, AuthError> {
    Url::parse(issuer)
        .and_then(|base| base.join(jwks_uri))
        .map_err(|e| AuthError::JwksFetchError(format!("Invalid JWKS URI {jwks_uri}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_support::{MockIdentityProvider, TEST_KID};

    #[test]
    fn jwks_url_resolution() {
        let issuer = "https://idp.example.com/api/v1/auth";
        assert_eq!(
            jwks_url(issuer, "https://keys.example.com/jwks.json")
                .unwrap()
                .as_str(),
            "https://keys.example.com/jwks.json"
        );
        assert_eq!(
            jwks_url(issuer, "/certs").unwrap().as_str(),
            "https://idp.example.com/certs"
        );
        assert!(jwks_url("not a url", "/certs").is_err());
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let url = Url::parse("https://example.com/.well-known/jwks.json").unwrap();
        let keys = RemoteKeySet::new(url, reqwest::Client::new())
            .with_cache_ttl(Duration::from_secs(60));
        assert_eq!(keys.cache_ttl, Duration::from_secs(60));
        assert!(!keys.is_cached().await);
    }

    #[tokio::test]
    async fn fetches_once_within_ttl() {
        let idp = MockIdentityProvider::start().await;
        idp.mount_jwks(1).await;

        let keys = RemoteKeySet::new(Url::parse(&idp.jwks_url()).unwrap(), reqwest::Client::new());
        let (_, alg) = keys.decoding_key(TEST_KID).await.unwrap();
        assert_eq!(alg, Algorithm::RS256);
        assert!(keys.is_cached().await);

        assert_eq!(keys.candidate_keys(Algorithm::RS256).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_kid_forces_one_refresh() {
        let idp = MockIdentityProvider::start().await;
        // Initial fetch plus exactly one forced refresh.
        idp.mount_jwks(2).await;

        let keys = RemoteKeySet::new(Url::parse(&idp.jwks_url()).unwrap(), reqwest::Client::new());
        assert_eq!(
            keys.decoding_key("rotated").await.err(),
            Some(AuthError::NoMatchingKey)
        );
        // Within the cool-down: no further fetch.
        assert_eq!(
            keys.decoding_key("rotated").await.err(),
            Some(AuthError::NoMatchingKey)
        );
    }

    #[tokio::test]
    async fn endpoint_failure_is_reported() {
        let idp = MockIdentityProvider::start().await;
        idp.mount_jwks_failure(503).await;

        let keys = RemoteKeySet::new(Url::parse(&idp.jwks_url()).unwrap(), reqwest::Client::new());
        let err = keys.candidate_keys(Algorithm::RS256).await.err();
        assert!(matches!(err, Some(AuthError::JwksFetchError(_))));
    }

    #[tokio::test]
    async fn candidate_keys_filter_by_algorithm() {
        let idp = MockIdentityProvider::start().await;
        idp.mount_rotated_jwks(1).await;

        let keys = RemoteKeySet::new(Url::parse(&idp.jwks_url()).unwrap(), reqwest::Client::new());
        assert_eq!(keys.candidate_keys(Algorithm::RS256).await.unwrap().len(), 2);
        // Declared RS256 keys are not offered for RS512 or EC tokens.
        assert_eq!(
            keys.candidate_keys(Algorithm::RS512).await.err(),
            Some(AuthError::NoMatchingKey)
        );
        assert_eq!(
            keys.candidate_keys(Algorithm::ES256).await.err(),
            Some(AuthError::NoMatchingKey)
        );
    }

    #[tokio::test]
    async fn provider_memoizes_key_set() {
        let idp = MockIdentityProvider::start().await;
        let config = crate::auth::test_support::auth_config(&idp, Default::default());
        let discovery = DiscoveryDocument {
            jwks_uri: idp.jwks_url(),
            metadata: Default::default(),
        };

        let provider = KeySetProvider::new(reqwest::Client::new());
        assert!(provider.cached().is_none());
        let first = provider.get(&discovery, &config).await.unwrap();
        let second = provider.get(&discovery, &config).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.url().as_str(), idp.jwks_url());
    }
}
