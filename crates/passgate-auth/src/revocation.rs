//! Revocation registry for logged-out tokens

use chrono::Utc;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};

/// Process-wide set of explicitly invalidated tokens.
///
/// Tokens are keyed by their SHA-256 digest so raw credentials never sit in
/// memory longer than the request that carried them. Each entry keeps the
/// token's own `exp`; once that instant has passed the codec rejects the
/// token anyway, and the entry can be pruned.
///
/// Nothing is persisted: a restart forgets all revocations.
#[derive(Default)]
pub struct RevocationRegistry {
    entries: DashMap<String, i64>,
}

impl RevocationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn key(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// Mark a token as revoked until `expires_at` (Unix seconds, the token's
    /// `exp`). Idempotent; never shortens an existing entry.
    pub fn revoke(&self, token: &str, expires_at: i64) {
        self.entries
            .entry(Self::key(token))
            .and_modify(|existing| *existing = (*existing).max(expires_at))
            .or_insert(expires_at);
        debug!("Token revoked, entry retained until {}", expires_at);
    }

    /// Check whether a token has been revoked
    pub fn is_revoked(&self, token: &str) -> bool {
        self.entries.contains_key(&Self::key(token))
    }

    /// Drop entries whose token has expired
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Utc::now().timestamp())
    }

    fn prune_expired_at(&self, now: i64) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, expires_at| {
            let keep = *expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Spawn a background task that periodically prunes the registry
pub fn spawn_prune_task(
    registry: Arc<RevocationRegistry>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    info!(
        "Starting revocation prune task (interval: {} seconds)",
        interval.as_secs()
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        // Skip the first tick (which fires immediately)
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = registry.prune_expired();
            if removed > 0 {
                info!(
                    "Pruned {} revocation entries ({} remaining)",
                    removed,
                    registry.len()
                );
            }
        }
    })
}
