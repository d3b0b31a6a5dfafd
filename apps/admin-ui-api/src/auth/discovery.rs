// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth2 authorization server metadata (RFC 8414) discovery.
//!
//! The document is fetched once and kept for the lifetime of the cache. When
//! the provider cannot be reached, or answers without a `jwks_uri`, a
//! synthetic document pointing at `{issuer}/.well-known/jwks.json` is cached
//! instead. Picking up a rotated JWKS URI requires a restart.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::auth::AuthConfig;

/// Authorization server metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// Location of the signing key set. Required.
    pub jwks_uri: String,

    /// Every other metadata field, as published.
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl DiscoveryDocument {
    /// Document used when discovery is unavailable.
    pub fn fallback(config: &AuthConfig) -> Self {
        Self {
            jwks_uri: config.default_jwks_url(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// Memoized discovery document.
#[derive(Debug)]
pub struct DiscoveryCache {
    client: reqwest::Client,
    document: OnceCell<Arc<DiscoveryDocument>>,
}

impl DiscoveryCache {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            document: OnceCell::new(),
        }
    }

    /// Get the discovery document, fetching it on first use.
    ///
    /// Never fails. Concurrent first callers wait on a single fetch.
    pub async fn get(&self, config: &AuthConfig) -> Arc<DiscoveryDocument> {
        self.document
            .get_or_init(|| async { Arc::new(self.fetch(config).await) })
            .await
            .clone()
    }

    /// Cached document, if discovery has already run.
    pub fn cached(&self) -> Option<Arc<DiscoveryDocument>> {
        self.document.get().cloned()
    }

    async fn fetch(&self, config: &AuthConfig) -> DiscoveryDocument {
        let discovery_url = config.discovery_url();
        debug!(discovery_url = %discovery_url, "Fetching OAuth2 discovery document");

        match self.client.get(&discovery_url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<DiscoveryDocument>().await {
                    Ok(document) => {
                        info!(
                            issuer = %config.issuer,
                            jwks_uri = %document.jwks_uri,
                            "Discovered JWKS URI"
                        );
                        return document;
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            issuer = %config.issuer,
                            "Discovery document has no usable jwks_uri, using fallback"
                        );
                    }
                }
            }
            Ok(response) => {
                warn!(
                    status = %response.status(),
                    issuer = %config.issuer,
                    "Discovery endpoint returned non-success status, using fallback"
                );
            }
            Err(e) => {
                warn!(
                    error = %e,
                    issuer = %config.issuer,
                    "Failed to fetch discovery document, using fallback"
                );
            }
        }

        DiscoveryDocument::fallback(config)
    }
}
