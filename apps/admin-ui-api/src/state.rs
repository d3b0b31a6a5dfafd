// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::TokenValidator;
use crate::config::env::EnvSource;
use crate::config::{ConfigError, ServerConfig};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub server: Arc<ServerConfig>,
    pub validator: Arc<TokenValidator>,
}

impl AppState {
    pub fn new(server: ServerConfig, validator: TokenValidator) -> Self {
        Self {
            server: Arc::new(server),
            validator: Arc::new(validator),
        }
    }

    /// Load server settings and build the token validator from `env`.
    pub fn from_env(env: Arc<dyn EnvSource>) -> Result<Self, ConfigError> {
        let server = ServerConfig::from_env(env.as_ref())?;
        let validator = TokenValidator::new(env)?;
        Ok(Self::new(server, validator))
    }

    /// Environment the validator and per-request settings read from.
    pub fn env(&self) -> &dyn EnvSource {
        self.validator.env()
    }
}
