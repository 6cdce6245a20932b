//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::FullRepository;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Bearer token for admin routes; `None` leaves them open
    pub admin_token: Option<Arc<str>>,
    /// Largest analytics batch accepted in one request
    pub max_batch_events: usize,
    pub body_limit_bytes: usize,
}

impl AppState {
    /// Create a new application state with default limits and no admin token.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::from_config(repository, &AppConfig::default())
    }

    pub fn from_config(repository: Arc<dyn FullRepository>, config: &AppConfig) -> Self {
        Self {
            repository,
            admin_token: config.server.admin_token.as_deref().map(Arc::from),
            max_batch_events: config.analytics.max_batch_events,
            body_limit_bytes: config.server.body_limit_bytes,
        }
    }

    pub fn with_admin_token(mut self, token: impl AsRef<str>) -> Self {
        self.admin_token = Some(Arc::from(token.as_ref()));
        self
    }
}
