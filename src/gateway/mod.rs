//! Axum-based HTTP gateway that puts the authentication gate in front of
//! resource routes.
//!
//! - `/health` is public
//! - everything mounted through [`protected_router`] runs the gate first;
//!   handlers read the caller's [`SanitizedAccount`] from request extensions
//! - request body limit and request timeout layers as on any public listener

pub mod outcome;

use crate::auth::{AuthGate, SanitizedAccount, SqliteAccountStore};
use crate::auth::claim::{HEADER_SALT, HEADER_TIMESTAMP, HEADER_TOKEN, HEADER_USERNAME};
use crate::config::{Config, GatewayConfig};
use anyhow::{Context, Result};
use axum::{
    extract::{Request, State},
    http::{header, HeaderName, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Extension, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub gate: AuthGate,
}

/// Middleware: authenticate the request, attach the sanitized identity, and
/// hand over to the next stage. Refused requests never reach the handler.
pub async fn require_authentication(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.gate.authenticate(request.headers()).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(failure) => outcome::failure_response(&failure),
    }
}

/// Put `routes` behind the authentication gate.
pub fn protected_router(routes: Router<AppState>, state: AppState) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state(state, require_authentication))
}

/// Build the full application router.
pub fn build_router(state: AppState, gateway: &GatewayConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(HEADER_USERNAME),
            HeaderName::from_static(HEADER_TIMESTAMP),
            HeaderName::from_static(HEADER_SALT),
            HeaderName::from_static(HEADER_TOKEN),
        ])
        .max_age(Duration::from_secs(3600));

    let protected = protected_router(
        Router::new().route("/api/me", get(handle_me)),
        state.clone(),
    );

    Router::new()
        .route("/health", get(handle_health))
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(gateway.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(gateway.request_timeout_secs),
        ))
}

/// Run the HTTP gateway until Ctrl+C.
pub async fn run_gateway(config: Config) -> Result<()> {
    let db_path = config.store.resolved_db_path()?;
    let store = SqliteAccountStore::open(&db_path)
        .with_context(|| format!("Failed to open account store at {}", db_path.display()))?;
    tracing::info!("Account store opened at {}", db_path.display());

    let gate = AuthGate::from_config(&config.authentication, Arc::new(store));
    let app = build_router(AppState { gate }, &config.gateway);

    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    tracing::info!(
        addr = %local,
        auth_window_seconds = config.authentication.auth_window_seconds,
        "Gateway listening"
    );
    println!("stampgate listening on http://{local}");
    println!("  GET  /health    — health check (public)");
    println!("  GET  /api/me    — authenticated identity (auth-* headers required)");
    println!("  Press Ctrl+C to stop.\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// GET /health — always public
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/me — the identity the gate attached
async fn handle_me(Extension(identity): Extension<SanitizedAccount>) -> Json<SanitizedAccount> {
    Json(identity)
}
