// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tracing subscriber setup.
//!
//! `LOG_FORMAT` (`json` or `pretty`) and `RUST_LOG` override the defaults
//! picked for the deployment environment.

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
    Registry,
};

use crate::config::env::{env_var, AppEnv, EnvSource};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// `LOG_FORMAT`, else pretty in development and JSON everywhere else.
    pub fn from_env(src: &dyn EnvSource, env: AppEnv) -> Self {
        match env_var(src, "LOG_FORMAT", None)
            .map(|v| v.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("pretty") => Self::Pretty,
            _ if env.is_development() || env == AppEnv::Test => Self::Pretty,
            _ => Self::Json,
        }
    }
}

/// Filter used when `RUST_LOG` is unset or invalid.
pub fn default_filter(env: AppEnv) -> &'static str {
    match env {
        AppEnv::Development | AppEnv::Test => "debug,tower_http=debug",
        AppEnv::Staging => "info,tower_http=debug",
        AppEnv::Production => "warn",
    }
}

/// Install the global subscriber.
pub fn init(src: &dyn EnvSource) -> Result<(), TryInitError> {
    let env = AppEnv::from_env(src);

    let filter = env_var(src, "RUST_LOG", None)
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter(env)));

    let json = LogFormat::from_env(src, env) == LogFormat::Json;

    Registry::default()
        .with(filter)
        .with(json.then(|| fmt::layer().with_target(true).json()))
        .with((!json).then(|| fmt::layer().with_target(true).pretty()))
        .try_init()
}
