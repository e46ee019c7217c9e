//! Passgate Core Business Logic
//!
//! This crate provides the identity service: sign-in, sign-up, logout and
//! the token check that every downstream service relies on.

pub mod error;
pub mod identity;

pub use error::CoreError;
pub use identity::{CheckOutcome, IdentityService, LoginSuccess, Registration, UserSummary};
