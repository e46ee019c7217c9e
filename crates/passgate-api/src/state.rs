//! Application state

use passgate_core::IdentityService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityService>,
}

impl AppState {
    pub fn new(identity: Arc<IdentityService>) -> Self {
        Self { identity }
    }
}
