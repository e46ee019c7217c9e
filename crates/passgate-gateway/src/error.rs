//! Gateway error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing, ambiguous or rejected credential
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid identity without the admin flag
    #[error("Admin privilege required")]
    Unauthorized,

    /// Identity service unreachable, slow, or answering garbage
    #[error("Identity service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Upstream failures are indistinguishable from a bad credential
        let (status, message) = match &self {
            GatewayError::Unauthorized => (StatusCode::FORBIDDEN, "Admin privilege required"),
            GatewayError::Unauthenticated
            | GatewayError::UpstreamUnavailable(_)
            | GatewayError::Http(_) => (StatusCode::UNAUTHORIZED, "Authentication required"),
        };

        let body = axum::Json(json!({
            "code": status.as_u16(),
            "message": message
        }));

        (status, body).into_response()
    }
}
