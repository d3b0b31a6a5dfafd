// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin UI API - configuration, health and token validation service
//!
//! Companion HTTP API of the admin single-page UI. It hands the UI its
//! bootstrap configuration and feature flags, answers health probes, and
//! validates OAuth2/OIDC bearer tokens issued by the identity provider.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and OpenAPI document
//! - `auth` - Bearer token validation, identity, auth middleware
//! - `config` - Environment-driven configuration
//! - `middleware` - Request ids, access logging, CORS, limits

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use config::env::{EnvSource, ProcessEnv};
use state::AppState;

/// Load configuration, bind, and serve until Ctrl+C.
pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env: Arc<dyn EnvSource> = Arc::new(ProcessEnv);
    logging::init(env.as_ref())?;

    let state = AppState::from_env(env)?;
    let addr = state.server.addr;
    let auth = state.validator.status().await;
    info!(
        environment = %state.server.environment,
        auth_enabled = auth.enabled,
        auth_mode = ?auth.mode,
        issuer = %auth.issuer,
        "Loaded configuration"
    );

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Admin UI API listening (docs at /docs)");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
