// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use keeper_core::KeeperError;
use keeper_service::VaultService;

use crate::auth::credential_middleware;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub service: Arc<VaultService>,
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the gateway router.
///
/// - GET /health (public)
/// - POST /v1/register, POST /v1/auth (public)
/// - POST /v1/secrets, GET/PUT/DELETE /v1/secrets/{keyword} (credential)
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/register", post(handlers::post_register))
        .route("/v1/auth", post(handlers::post_auth))
        .with_state(state.clone());

    let secret_routes = Router::new()
        .route("/v1/secrets", post(handlers::post_secret))
        .route(
            "/v1/secrets/{keyword}",
            get(handlers::get_secret)
                .put(handlers::put_secret)
                .delete(handlers::delete_secret),
        )
        .route_layer(axum_middleware::from_fn(credential_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(secret_routes)
        .layer(TraceLayer::new_for_http())
}

/// Serve the gateway until `shutdown` resolves.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), KeeperError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| KeeperError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| KeeperError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}
