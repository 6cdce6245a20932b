//! Repository trait for ingested analytics events.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{AnalyticsEvent, EventStats, StoredEvent};

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append a batch. Events are stored as received; duplicates are kept.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of events stored
    async fn store_events(&self, events: &[AnalyticsEvent]) -> RepositoryResult<usize>;

    async fn event_stats(&self) -> RepositoryResult<EventStats>;

    /// Most recent events, newest first.
    async fn recent_events(&self, limit: usize) -> RepositoryResult<Vec<StoredEvent>>;
}
