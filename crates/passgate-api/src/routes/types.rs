//! Request/Response DTOs for the identity API

use passgate_core::UserSummary;
use serde::{Deserialize, Serialize};

/// Sign-in request
#[derive(Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// Sign-in response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub success: bool,
    pub token: String,
    pub expires_in: i64,
    pub user: UserSummary,
}

/// Sign-up request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Sign-up response
#[derive(Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
}

/// Logout response
#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}
