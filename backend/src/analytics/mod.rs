//! Client-side analytics pipeline.
//!
//! Events are queued in memory and mirrored into a [`Storage`] so they survive
//! a restart. A background task sends them in batches to an [`EventSink`];
//! events leave the queue only once the sink accepts them.
//!
//! ```text
//!  track_*() ──► queue (capped, FIFO eviction) ──► Storage ("analytics_queue")
//!                   │
//!                   │ batch_size reached | interval | error event | shutdown
//!                   ▼
//!               flush() ──► EventSink (HttpSink → POST /v1/analytics/events)
//!                   │
//!                   └─ failure: batch stays at the head of the queue
//! ```
//!
//! Tracking is gated on the `enabled` switch, stored consent and
//! Do-Not-Track. Withdrawing consent discards everything queued.

pub mod config;
pub mod sink;
pub mod storage;
pub mod tracker;

pub use config::AnalyticsConfig;
pub use sink::{EventSink, MemorySink};
pub use storage::{FileStorage, MemoryStorage, Storage, CONSENT_KEY, QUEUE_KEY};
pub use tracker::Analytics;

#[cfg(feature = "client")]
pub use sink::HttpSink;

/// Errors raised inside the analytics pipeline.
///
/// None of these reach callers of the `track_*` methods; they surface only
/// from [`Analytics::flush`] and the storage backends.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Delivery failed; the batch may succeed if sent again.
    #[error("Sink rejected batch: {0}")]
    Sink(String),

    /// The receiver refused the batch itself; resending cannot succeed.
    #[error("Sink refused batch permanently: {0}")]
    Rejected(String),
}
