//! Analytics ingestion.

use log::{debug, info};

use super::validation::validate_event_batch;
use super::ServiceResult;
use crate::db::FullRepository;
use crate::models::{EventBatch, EventStats};

/// Validate and store a batch. Returns the number of events accepted.
///
/// Events are stored as sent; a client that retries a batch after a lost
/// response will be counted twice.
pub async fn ingest<R: FullRepository + ?Sized>(
    repo: &R,
    batch: &EventBatch,
    max_events: usize,
) -> ServiceResult<usize> {
    validate_event_batch(batch, max_events)?;
    for event in &batch.events {
        debug!(
            "event {} type={} session={}",
            event.name,
            event.event_type.as_str(),
            event.session_id
        );
    }
    let accepted = repo.store_events(&batch.events).await?;
    info!("Ingested {} analytics events", accepted);
    Ok(accepted)
}

pub async fn stats<R: FullRepository + ?Sized>(repo: &R) -> ServiceResult<EventStats> {
    Ok(repo.event_stats().await?)
}
