//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use voxrule_storage::RuleStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RuleStore>,
    /// Expected bearer token for protected routes.
    pub api_token: String,
    /// Port the server listens on; browser origins on it are allowed by CORS.
    pub port: u16,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<RuleStore>, api_token: String, port: u16) -> Self {
        Self {
            store,
            api_token,
            port,
            start_time: Instant::now(),
        }
    }
}
