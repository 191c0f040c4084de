//! Primary service listener.
//!
//! Owns the process lifetime. The application's routed API endpoints are
//! mounted by the backend service layer; this module provides the
//! process-level surface (health, 404 fallback) and the listener itself.

use std::sync::Arc;

use anyhow::Context;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;

/// Bind the primary port, signal readiness, and serve until shutdown.
///
/// The readiness signal is sent after a successful bind so the front-door
/// listener never proxies to a backend that is not yet accepting
/// connections. A bind failure drops the sender, which the front door
/// observes and exits on.
pub async fn run_primary(ctx: Arc<AppContext>, ready: oneshot::Sender<()>) -> anyhow::Result<()> {
    let listen_addr = ctx.config.server.listen_address.clone();

    let app = Router::new()
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind primary port {listen_addr}"))?;

    // Bind succeeded: the front door may start accepting connections.
    let _ = ready.send(());
    tracing::info!(address = %listen_addr, "primary listener ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("primary listener shut down gracefully");
    Ok(())
}

/// Health check endpoint.
async fn handle_health() -> impl IntoResponse {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({ "error": "not found" })),
    )
        .into_response()
}

/// Wait for SIGINT (Ctrl+C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install CTRL+C signal handler");
        // Fall through: without a signal handler the listener just runs
        // until the process is killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections...");
}
