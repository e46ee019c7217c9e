//! Health check endpoints

use axum::{Router, routing::get};

use crate::state::AppState;

/// Liveness only; touches no state
async fn health() -> &'static str {
    "I'm up!"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
}
