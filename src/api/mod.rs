//! HTTP API layer, built on Axum.
//!
//! # Endpoints
//!
//! - `GET  /health` - Health check and index stats
//! - `POST /ingest` - Ingest a directory of documents
//! - `POST /search` - Retrieval and ranking only, no generation
//! - `POST /ask`    - Answer a question from the indexed corpus
//!
//! Errors are returned as `{ "error": ..., "stage": ... }` with the HTTP
//! status derived from the failing stage: invalid input is 400, upstream
//! service failures are 502.

/// Request and response handlers for each endpoint.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{AppError, Result};
use crate::AppState;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Bind and serve the API until the state's shutdown token is cancelled.
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let router = routes::create_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))?;

    Ok(())
}
