// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Server settings are loaded once at startup through [`ServerConfig::from_env`].
//! Auth settings ([`auth::AuthConfig`]) and feature flags are re-read from the
//! environment whenever they are needed.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `NODE_ENV` | `development`, `staging`, `production` or `test` | `development` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `4000` |
//! | `API_URL` | Backend API URL handed to the UI | `http://localhost:8080/api` |
//! | `CORS_ORIGINS` | Comma-separated allowed origins (`*` mirrors the caller) | per environment |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | per environment |
//! | `RUST_LOG` | Log level filter | per environment |
//! | `ENABLE_ANALYTICS` | Feature flag | `false` |
//! | `ENABLE_REAL_TIME_UPDATES` | Feature flag | `false` |
//! | `ENABLE_OFFLINE_MODE` | Feature flag | `false` |
//! | `ENABLE_DARK_MODE` | Feature flag | `false` |
//! | `AUTH_ISSUER` | OAuth2 issuer base URL | per environment |
//! | `OAUTH2_CLIENT_ID` | OAuth2 client id, expected token audience | `admin-ui-client` |
//! | `OAUTH2_CLIENT_SECRET` | Client secret for introspection | Required for introspection |
//! | `JWT_SECRET` | HMAC secret for locally signed tokens | Required for local validation |
//! | `OAUTH2_SERVICE_ENABLED` | Accept bearer tokens at all | `false` |
//! | `OAUTH2_INTROSPECTION_ENABLED` | Validate tokens remotely | `false` |
//! | `OAUTH2_SERVICE_TO_SERVICE_ENABLED` | Service-to-service tokens | `false` |

pub mod auth;
pub mod env;

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Serialize;
use utoipa::ToSchema;

use env::{env_bool, env_var, env_vars_with_prefix, AppEnv, EnvSource};

/// Default backend API URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 4000;

/// Prefix of feature flag variables.
pub const FEATURE_FLAG_PREFIX: &str = "ENABLE_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Request handling limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub timeout: Duration,
    pub max_body_bytes: usize,
}

impl RequestLimits {
    pub fn for_env(env: AppEnv) -> Self {
        if env.is_production() {
            Self {
                timeout: Duration::from_secs(15),
                max_body_bytes: 5 * 1024 * 1024,
            }
        } else {
            Self {
                timeout: Duration::from_secs(30),
                max_body_bytes: 10 * 1024 * 1024,
            }
        }
    }
}

/// Browser CORS policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsSettings {
    /// Allowed origins. `*` allows any origin by echoing it back.
    pub origins: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Duration,
}

impl CorsSettings {
    pub fn from_env(src: &dyn EnvSource, env: AppEnv) -> Self {
        let configured: Vec<String> = env_var(src, "CORS_ORIGINS", None)
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let origins = if !configured.is_empty() {
            configured
        } else if env.is_production() {
            // No allowlist in production means no CORS headers at all.
            Vec::new()
        } else {
            vec![
                "http://localhost:4200".to_string(),
                "http://localhost:4000".to_string(),
            ]
        };

        let max_age = if env.is_production() {
            Duration::from_secs(60 * 60)
        } else {
            Duration::from_secs(24 * 60 * 60)
        };

        Self {
            origins,
            allow_credentials: true,
            max_age,
        }
    }

    pub fn allows_any(&self) -> bool {
        self.origins.iter().any(|o| o == "*")
    }
}

/// Settings read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub environment: AppEnv,
    pub addr: SocketAddr,
    pub api_url: String,
    pub cors: CorsSettings,
    pub limits: RequestLimits,
}

impl ServerConfig {
    /// Load from the environment. Fails closed on an unusable `HOST` or `PORT`.
    pub fn from_env(src: &dyn EnvSource) -> Result<Self, ConfigError> {
        let environment = AppEnv::from_env(src);

        let host: IpAddr = env_var(src, "HOST", Some("0.0.0.0"))
            .unwrap_or_default()
            .parse()
            .map_err(|_| ConfigError::Invalid("HOST"))?;

        let port = match env_var(src, "PORT", None) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            environment,
            addr: SocketAddr::new(host, port),
            api_url: api_url(src),
            cors: CorsSettings::from_env(src, environment),
            limits: RequestLimits::for_env(environment),
        })
    }
}

/// Backend API URL handed to the UI.
pub fn api_url(src: &dyn EnvSource) -> String {
    env_var(src, "API_URL", Some(DEFAULT_API_URL)).unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// UI feature toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub enable_analytics: bool,
    pub enable_real_time_updates: bool,
    pub enable_offline_mode: bool,
    pub enable_dark_mode: bool,
    /// Additional `ENABLE_*` variables, keyed by camelCase flag name.
    #[serde(flatten)]
    pub extra: BTreeMap<String, bool>,
}

impl FeatureFlags {
    /// The four well-known flags.
    pub fn from_env(src: &dyn EnvSource) -> Self {
        Self {
            enable_analytics: env_bool(src, "ENABLE_ANALYTICS", false),
            enable_real_time_updates: env_bool(src, "ENABLE_REAL_TIME_UPDATES", false),
            enable_offline_mode: env_bool(src, "ENABLE_OFFLINE_MODE", false),
            enable_dark_mode: env_bool(src, "ENABLE_DARK_MODE", false),
            extra: BTreeMap::new(),
        }
    }

    /// Well-known flags plus environment-derived and any other `ENABLE_*` flags.
    pub fn full_from_env(src: &dyn EnvSource) -> Self {
        let mut flags = Self::from_env(src);
        let development = AppEnv::from_env(src).is_development();
        flags.extra.insert("enableBetaFeatures".into(), development);
        flags.extra.insert("enableDebugMode".into(), development);
        flags.extra.insert("enableMaintenanceMode".into(), false);

        for key in env_vars_with_prefix(src, FEATURE_FLAG_PREFIX).into_keys() {
            let name = flag_name(&key);
            if Self::is_well_known(&name) {
                continue;
            }
            let enabled = env_bool(src, &key, false);
            flags.extra.insert(name, enabled);
        }
        flags
    }

    fn is_well_known(name: &str) -> bool {
        matches!(
            name,
            "enableAnalytics" | "enableRealTimeUpdates" | "enableOfflineMode" | "enableDarkMode"
        )
    }
}

/// `ENABLE_BULK_EXPORT` -> `enableBulkExport`.
fn flag_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for (i, word) in key.split('_').filter(|w| !w.is_empty()).enumerate() {
        let lower = word.to_ascii_lowercase();
        if i == 0 {
            name.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use env::StaticEnv;

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::from_env(&StaticEnv::new()).unwrap();
        assert_eq!(config.addr.to_string(), "0.0.0.0:4000");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.environment, AppEnv::Development);
        assert_eq!(config.limits.timeout, Duration::from_secs(30));
        assert_eq!(config.limits.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(
            config.cors.origins,
            vec!["http://localhost:4200", "http://localhost:4000"]
        );
    }

    #[test]
    fn server_config_rejects_bad_port_and_host() {
        let env = StaticEnv::new().with("PORT", "http");
        assert!(matches!(
            ServerConfig::from_env(&env),
            Err(ConfigError::Invalid("PORT"))
        ));

        let env = StaticEnv::new().with("HOST", "not a host");
        assert!(matches!(
            ServerConfig::from_env(&env),
            Err(ConfigError::Invalid("HOST"))
        ));
    }

    #[test]
    fn production_tightens_limits_and_cors() {
        let env = StaticEnv::new().with("NODE_ENV", "production");
        let config = ServerConfig::from_env(&env).unwrap();
        assert_eq!(config.limits.timeout, Duration::from_secs(15));
        assert_eq!(config.limits.max_body_bytes, 5 * 1024 * 1024);
        assert!(config.cors.origins.is_empty());
        assert_eq!(config.cors.max_age, Duration::from_secs(3600));

        let env = StaticEnv::new()
            .with("NODE_ENV", "production")
            .with("CORS_ORIGINS", "https://admin.recipe-app.com, *");
        let cors = ServerConfig::from_env(&env).unwrap().cors;
        assert_eq!(cors.origins, vec!["https://admin.recipe-app.com", "*"]);
        assert!(cors.allows_any());
    }

    #[test]
    fn feature_flags_include_extra_enable_vars() {
        let env: StaticEnv = [
            ("ENABLE_ANALYTICS", "true"),
            ("ENABLE_DARK_MODE", "no"),
            ("ENABLE_BULK_EXPORT", "1"),
        ]
        .into_iter()
        .collect();

        let flags = FeatureFlags::full_from_env(&env);
        assert!(flags.enable_analytics);
        assert!(!flags.enable_dark_mode);
        assert_eq!(flags.extra.get("enableBulkExport"), Some(&true));
        assert_eq!(flags.extra.get("enableBetaFeatures"), Some(&true));
        assert_eq!(flags.extra.get("enableMaintenanceMode"), Some(&false));
        assert!(!flags.extra.contains_key("enableAnalytics"));

        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(json["enableAnalytics"], true);
        assert_eq!(json["enableBulkExport"], true);
    }

    #[test]
    fn flag_names_are_camel_cased() {
        assert_eq!(flag_name("ENABLE_REAL_TIME_UPDATES"), "enableRealTimeUpdates");
        assert_eq!(flag_name("ENABLE_X"), "enableX");
    }
}
