//! Destinations for flushed analytics batches.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::AnalyticsError;
use crate::models::AnalyticsEvent;

/// Receives batches from [`Analytics::flush`](super::Analytics::flush).
///
/// A batch counts as delivered only when `send` returns `Ok`. On
/// [`AnalyticsError::Rejected`] it is dropped; on any other `Err` the same
/// events are offered again on a later flush.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, events: &[AnalyticsEvent]) -> Result<(), AnalyticsError>;
}

/// Records batches in memory. Can be switched to fail on demand.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Mutex<Vec<Vec<AnalyticsEvent>>>,
    failing: AtomicBool,
    rejecting: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (`true`) or succeed (`false`).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make subsequent sends fail permanently.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<Vec<AnalyticsEvent>> {
        self.batches.lock().clone()
    }

    /// Every delivered event, in delivery order.
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.batches.lock().iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn send(&self, events: &[AnalyticsEvent]) -> Result<(), AnalyticsError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AnalyticsError::Sink("memory sink set to fail".to_string()));
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(AnalyticsError::Rejected("memory sink set to reject".to_string()));
        }
        self.batches.lock().push(events.to_vec());
        Ok(())
    }
}

#[cfg(feature = "client")]
pub use http::HttpSink;

#[cfg(feature = "client")]
mod http {
    use super::*;
    use crate::client::{handle_error, ApiClient};
    use crate::models::EventBatch;

    /// Posts batches to the ingestion endpoint.
    #[derive(Debug, Clone)]
    pub struct HttpSink {
        client: ApiClient,
    }

    impl HttpSink {
        pub fn new(client: ApiClient) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl EventSink for HttpSink {
        async fn send(&self, events: &[AnalyticsEvent]) -> Result<(), AnalyticsError> {
            let batch = EventBatch {
                events: events.to_vec(),
            };
            self.client.send_events(&batch).await.map(|_| ()).map_err(|e| {
                let handled = handle_error(&e);
                let reason = format!("{} ({})", e.message, handled.kind);
                if handled.can_retry {
                    AnalyticsError::Sink(reason)
                } else {
                    AnalyticsError::Rejected(reason)
                }
            })
        }
    }
}
