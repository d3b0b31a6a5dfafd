// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Environment variable access.
//!
//! All configuration flows through an [`EnvSource`] so that request-time
//! lookups (auth settings are resolved on every validation) can be pointed at
//! a fixed map in tests instead of the process environment.
//!
//! Empty and whitespace-only values are treated as unset.

use std::collections::HashMap;
use std::sync::Once;

use super::ConfigError;

/// Source of environment variables.
pub trait EnvSource: Send + Sync {
    /// Raw lookup. Implementations return `None` for unset variables.
    fn var(&self, key: &str) -> Option<String>;

    /// Every variable in the source.
    fn vars(&self) -> Vec<(String, String)>;
}

static DOTENV: Once = Once::new();

fn load_dotenv() {
    DOTENV.call_once(|| {
        // Absent file is the normal case in containers.
        let _ = dotenvy::dotenv();
    });
}

/// The real process environment.
///
/// The first lookup loads a local `.env` file if one exists. Variables that
/// are already set always take precedence over the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        load_dotenv();
        std::env::var(key).ok()
    }

    fn vars(&self) -> Vec<(String, String)> {
        load_dotenv();
        std::env::vars().collect()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: HashMap<String, String>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn vars(&self) -> Vec<(String, String)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Get a variable, falling back to `default` when unset.
pub fn env_var(src: &dyn EnvSource, key: &str, default: Option<&str>) -> Option<String> {
    src.var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| default.map(str::to_string))
}

/// Get a variable that must be present.
pub fn required_env_var(src: &dyn EnvSource, key: &'static str) -> Result<String, ConfigError> {
    env_var(src, key, None).ok_or(ConfigError::Missing(key))
}

/// Get a variable as a boolean.
///
/// `true`, `1` and `yes` (any case) are true. Any other set value is false.
pub fn env_bool(src: &dyn EnvSource, key: &str, default: bool) -> bool {
    match env_var(src, key, None) {
        Some(value) => matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        None => default,
    }
}

/// Get a variable as an integer.
pub fn env_number(src: &dyn EnvSource, key: &str, default: Option<i64>) -> Option<i64> {
    let Some(value) = env_var(src, key, None) else {
        return default;
    };
    match value.parse::<i64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "environment variable is not a valid number");
            default
        }
    }
}

/// All set variables whose name starts with `prefix`.
pub fn env_vars_with_prefix(src: &dyn EnvSource, prefix: &str) -> HashMap<String, String> {
    src.vars()
        .into_iter()
        .filter(|(key, value)| key.starts_with(prefix) && !value.trim().is_empty())
        .collect()
}

/// Deployment environment, from `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Staging,
    Production,
    Test,
}

impl AppEnv {
    pub fn from_env(src: &dyn EnvSource) -> Self {
        match env_var(src, "NODE_ENV", Some("development"))
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            "staging" => Self::Staging,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Test => "test",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for AppEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_fall_back_to_default() {
        let env = StaticEnv::new().with("API_URL", "   ");
        assert_eq!(
            env_var(&env, "API_URL", Some("http://fallback")),
            Some("http://fallback".to_string())
        );
        assert_eq!(env_var(&env, "MISSING", None), None);
    }

    #[test]
    fn required_var_fails_closed() {
        let env = StaticEnv::new();
        let err = required_env_var(&env, "JWT_SECRET").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));

        let env = StaticEnv::new().with("JWT_SECRET", "s3cret");
        assert_eq!(required_env_var(&env, "JWT_SECRET").unwrap(), "s3cret");
    }

    #[test]
    fn bool_parsing_accepts_common_truthy_values() {
        let env: StaticEnv = [("A", "TRUE"), ("B", "1"), ("C", "yes"), ("D", "on"), ("E", "false")]
            .into_iter()
            .collect();
        assert!(env_bool(&env, "A", false));
        assert!(env_bool(&env, "B", false));
        assert!(env_bool(&env, "C", false));
        assert!(!env_bool(&env, "D", true));
        assert!(!env_bool(&env, "E", true));
        assert!(env_bool(&env, "UNSET", true));
    }

    #[test]
    fn invalid_number_yields_default() {
        let env = StaticEnv::new().with("PORT", "forty").with("WORKERS", "8");
        assert_eq!(env_number(&env, "PORT", Some(4000)), Some(4000));
        assert_eq!(env_number(&env, "WORKERS", None), Some(8));
        assert_eq!(env_number(&env, "UNSET", Some(1)), Some(1));
        assert_eq!(env_number(&env, "UNSET", None), None);
    }

    #[test]
    fn prefix_lookup_skips_empty_values() {
        let env: StaticEnv = [
            ("ENABLE_ANALYTICS", "true"),
            ("ENABLE_EMPTY", ""),
            ("API_URL", "http://x"),
        ]
        .into_iter()
        .collect();
        let found = env_vars_with_prefix(&env, "ENABLE_");
        assert_eq!(found.len(), 1);
        assert_eq!(found["ENABLE_ANALYTICS"], "true");
    }

    #[test]
    fn app_env_defaults_to_development() {
        assert_eq!(AppEnv::from_env(&StaticEnv::new()), AppEnv::Development);
        let env = StaticEnv::new().with("NODE_ENV", "Production");
        assert!(AppEnv::from_env(&env).is_production());
        let env = StaticEnv::new().with("NODE_ENV", "staging");
        assert_eq!(AppEnv::from_env(&env), AppEnv::Staging);
    }
}
