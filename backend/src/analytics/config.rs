//! Analytics pipeline settings.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_STORED_EVENTS: usize = 100;
/// Largest batch the ingestion endpoint accepts by default.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    /// Base URL of the ingestion API.
    pub api_url: String,
    /// Events per flush; reaching it also triggers one.
    pub batch_size: usize,
    pub batch_interval: Duration,
    /// Queue capacity. The oldest events are evicted beyond it.
    pub max_stored_events: usize,
    pub enabled: bool,
    /// Log every accepted event.
    pub debug: bool,
    pub respect_do_not_track: bool,
    /// The user has asked not to be tracked.
    pub do_not_track: bool,
    /// JSON file backing the queue; in-memory when unset.
    pub storage_path: Option<PathBuf>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_interval: DEFAULT_BATCH_INTERVAL,
            max_stored_events: DEFAULT_MAX_STORED_EVENTS,
            enabled: true,
            debug: false,
            respect_do_not_track: true,
            do_not_track: false,
            storage_path: None,
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

impl AnalyticsConfig {
    /// Defaults overridden by `MARKETPLACE_API_URL`, `ANALYTICS_ENABLED`,
    /// `ANALYTICS_DEBUG`, `ANALYTICS_STORAGE_PATH` and `DO_NOT_TRACK`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("MARKETPLACE_API_URL") {
            config.api_url = url;
        }
        if let Some(enabled) = env_flag("ANALYTICS_ENABLED") {
            config.enabled = enabled;
        }
        if let Some(debug) = env_flag("ANALYTICS_DEBUG") {
            config.debug = debug;
        }
        if let Some(dnt) = env_flag("DO_NOT_TRACK") {
            config.do_not_track = dnt;
        }
        config.storage_path = env::var("ANALYTICS_STORAGE_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        config
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_interval(mut self, interval: Duration) -> Self {
        self.batch_interval = interval;
        self
    }

    /// `batch_size` within `1..=MAX_BATCH_SIZE`.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    /// `max_stored_events`, at least 1.
    pub fn effective_max_stored_events(&self) -> usize {
        self.max_stored_events.max(1)
    }

    /// `batch_interval`, with zero replaced by the default.
    pub fn effective_batch_interval(&self) -> Duration {
        if self.batch_interval.is_zero() {
            DEFAULT_BATCH_INTERVAL
        } else {
            self.batch_interval
        }
    }

    pub fn with_max_stored_events(mut self, max: usize) -> Self {
        self.max_stored_events = max.max(1);
        self
    }

    /// Whether Do-Not-Track blocks tracking.
    pub fn blocked_by_do_not_track(&self) -> bool {
        self.respect_do_not_track && self.do_not_track
    }
}
