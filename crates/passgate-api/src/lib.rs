//! Passgate Identity API
//!
//! This crate provides the Axum-based HTTP surface of the identity service:
//! sign-in, sign-up, logout, token verification and liveness.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
