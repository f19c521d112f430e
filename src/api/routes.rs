use crate::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(crate::api::handlers::health))
        .route("/ingest", post(crate::api::handlers::ingest))
        .route("/search", post(crate::api::handlers::search))
        .route("/ask", post(crate::api::handlers::ask))
}
