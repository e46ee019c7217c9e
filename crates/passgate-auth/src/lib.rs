//! Passgate Token Authentication
//!
//! This crate provides the credential primitives shared by the identity
//! service: signed expiring tokens, the revocation registry consulted on
//! every verification, and one-way password hashing.

pub mod error;
pub mod jwt;
pub mod password;
pub mod revocation;

pub use error::AuthError;
pub use jwt::{Claims, DEFAULT_TOKEN_TTL_SECS, TOKEN_AUDIENCE, TOKEN_ISSUER, TokenCodec};
pub use password::{hash_password, verify_password};
pub use revocation::{RevocationRegistry, spawn_prune_task};
