//! API routes

mod auth;
mod health;
pub mod types;

use axum::Router;

use crate::state::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Liveness
        .merge(health::routes())
        // Sign-in, sign-up, logout, verify
        .merge(auth::routes())
        .with_state(state)
}
