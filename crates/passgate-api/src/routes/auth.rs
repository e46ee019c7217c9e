//! Identity routes: sign-in, sign-up, logout and token verification

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::{delete, get, post},
};
use passgate_core::Registration;
use passgate_gateway::{CheckResponse, credential_from_headers};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

use super::types::{LogoutResponse, SigninRequest, SigninResponse, SignupRequest, SignupResponse};

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 128;

/// Validate username format and length
fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Only allow alphanumeric characters, underscores, dots and hyphens
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, underscores, dots, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate password length
fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password cannot be empty".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.len() > MAX_EMAIL_LENGTH || !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.len() > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "{} exceeds maximum length of {} characters",
            field, MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

// ==================== Auth Routes ====================

/// POST /signin
async fn signin(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    // Bound input sizes before hashing anything
    if request.username.len() > MAX_USERNAME_LENGTH || request.password.len() > MAX_PASSWORD_LENGTH
    {
        return Err(ApiError::BadRequest(
            "Credentials exceed maximum length".to_string(),
        ));
    }

    let login = state
        .identity
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(SigninResponse {
        success: true,
        token: login.token,
        expires_in: login.expires_in,
        user: login.user,
    }))
}

/// POST /signup
async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password)?;
    validate_email(&request.email)?;
    validate_name("First name", &request.first_name)?;
    validate_name("Last name", &request.last_name)?;

    debug!("Sign-up request for user: {}", request.username);

    let user = state
        .identity
        .register(Registration {
            username: request.username,
            email: request.email,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
        })
        .await?;

    Ok(Json(SignupResponse {
        success: true,
        message: "User registered successfully".to_string(),
        user,
    }))
}

/// DELETE /logout
///
/// The token must still verify; revoking it afterwards cannot fail.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    let token = credential_from_headers(&headers).ok_or(ApiError::InvalidToken)?;

    let check = state.identity.check(token).await?;
    if !check.valid {
        return Err(ApiError::InvalidToken);
    }

    state.identity.logout(token);

    if let Some(subject) = check.subject {
        info!("User {} logged out", subject);
    }

    Ok(Json(LogoutResponse {
        success: true,
        message: "User logged out successfully".to_string(),
    }))
}

/// GET /verify-token
///
/// Machine-to-machine check used by every downstream gateway. Always 200
/// unless the service itself is broken; the verdict is in the body.
async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CheckResponse>, ApiError> {
    let Some(token) = credential_from_headers(&headers) else {
        return Ok(Json(CheckResponse::default()));
    };

    let check = state.identity.check(token).await?;

    Ok(Json(CheckResponse {
        valid: check.valid,
        subject: check.subject,
        admin: check.admin,
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signin", post(signin))
        .route("/signup", post(signup))
        .route("/logout", delete(logout))
        .route("/verify-token", get(verify_token))
}
