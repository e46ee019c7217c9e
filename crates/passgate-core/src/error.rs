//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] passgate_db::DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] passgate_auth::AuthError),

    /// Unknown user or wrong password; the two are never told apart
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,
}
