//! Identity service
//!
//! Composes the credential store, the token codec and the revocation
//! registry. [`IdentityService::check`] is the single verification entry
//! point downstream services call; it answers with a verdict only, never a
//! reason.

use passgate_auth::{RevocationRegistry, TokenCodec, hash_password, verify_password};
use passgate_db::{Database, DbError, NewUser, User};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::CoreError;

/// Public view of a user; never carries the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Sign-up input
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Successful sign-in
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub token: String,
    pub expires_in: i64,
    pub user: UserSummary,
}

/// Verdict of a token check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    pub valid: bool,
    pub subject: Option<String>,
    pub admin: bool,
}

impl CheckOutcome {
    fn invalid() -> Self {
        Self::default()
    }
}

pub struct IdentityService {
    db: Database,
    codec: TokenCodec,
    revocations: Arc<RevocationRegistry>,
    /// Verified against when the user is unknown, keeping sign-in timing flat
    dummy_hash: String,
}

impl IdentityService {
    pub fn new(
        db: Database,
        codec: TokenCodec,
        revocations: Arc<RevocationRegistry>,
    ) -> Result<Self, CoreError> {
        let dummy_hash = hash_password("passgate-timing-equalizer")?;
        Ok(Self {
            db,
            codec,
            revocations,
            dummy_hash,
        })
    }

    /// Lifetime of issued tokens, in seconds
    pub fn token_ttl_secs(&self) -> i64 {
        self.codec.ttl().num_seconds()
    }

    /// Authenticate a user and issue a token
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, CoreError> {
        debug!("Login attempt for user: {}", username);

        let user = self.db.get_user_by_username(username).await?;

        // Always run the hash check, even for unknown users
        let hash_to_verify = user
            .as_ref()
            .map(|u| u.password_hash.as_str())
            .unwrap_or(self.dummy_hash.as_str());
        let password_valid = verify_password(password, hash_to_verify)?;

        let user = match (user, password_valid) {
            (Some(u), true) => u,
            _ => {
                debug!("Login rejected for user: {}", username);
                return Err(CoreError::InvalidCredentials);
            }
        };

        let token = self.codec.issue(&user.username)?;

        info!("User {} logged in successfully", user.username);

        Ok(LoginSuccess {
            token,
            expires_in: self.token_ttl_secs(),
            user: UserSummary::from(&user),
        })
    }

    /// Create a non-admin account. Only the username must be unique.
    pub async fn register(&self, registration: Registration) -> Result<UserSummary, CoreError> {
        self.create_user(registration, false).await
    }

    /// Create the configured admin account if it does not exist yet
    pub async fn ensure_admin(&self, registration: Registration) -> Result<bool, CoreError> {
        match self.create_user(registration, true).await {
            Ok(_) => Ok(true),
            Err(CoreError::UsernameTaken) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_user(
        &self,
        registration: Registration,
        is_admin: bool,
    ) -> Result<UserSummary, CoreError> {
        let password_hash = hash_password(&registration.password)?;

        let user = self
            .db
            .insert_user(NewUser {
                username: registration.username,
                email: registration.email,
                password_hash,
                first_name: registration.first_name,
                last_name: registration.last_name,
                is_admin,
            })
            .await
            .map_err(|e| match e {
                DbError::Duplicate(_) => {
                    debug!("Username already taken");
                    CoreError::UsernameTaken
                }
                other => CoreError::Database(other),
            })?;

        info!("Registered user: {} (admin: {})", user.username, user.is_admin);
        Ok(UserSummary::from(&user))
    }

    /// Revoke a token. Unknown or already invalid tokens are accepted silently.
    ///
    /// The entry lives until the token's own `exp`. A token that does not
    /// verify now can never verify later, so it needs no entry.
    pub fn logout(&self, token: &str) {
        match self.codec.parse_and_verify(token) {
            Ok(claims) => self.revocations.revoke(token, claims.exp),
            Err(_) => debug!("Logout of a token that is already invalid"),
        }
    }

    /// Decide whether a token is currently valid
    ///
    /// `admin` is only ever true for a valid token whose subject still exists
    /// and carries the admin flag.
    pub async fn check(&self, token: &str) -> Result<CheckOutcome, CoreError> {
        let claims = match self.codec.parse_and_verify(token) {
            Ok(claims) => claims,
            Err(_) => return Ok(CheckOutcome::invalid()),
        };

        if self.revocations.is_revoked(token) {
            debug!("Token for {} rejected: revoked", claims.sub);
            return Ok(CheckOutcome::invalid());
        }

        let admin = self
            .db
            .get_user_by_username(&claims.sub)
            .await?
            .is_some_and(|user| user.is_admin);

        Ok(CheckOutcome {
            valid: true,
            subject: Some(claims.sub),
            admin,
        })
    }
}
