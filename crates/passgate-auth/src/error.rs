//! Authentication error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Expired, forged, malformed, or revoked. The cause is never exposed.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token subject cannot be empty")]
    EmptySubject,

    #[error("Token encoding error: {0}")]
    TokenEncoding(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}
