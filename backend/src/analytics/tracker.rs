//! The analytics queue and its flusher.

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use super::config::AnalyticsConfig;
use super::sink::EventSink;
use super::storage::{MemoryStorage, Storage, CONSENT_KEY, QUEUE_KEY};
use super::AnalyticsError;
use crate::models::{AnalyticsEvent, EventType, Properties};
use crate::services::validation::EVENT_NAME_MAX_LEN;

const CONSENT_GRANTED: &str = "granted";
const CONSENT_DENIED: &str = "denied";

struct QueueState {
    queue: VecDeque<AnalyticsEvent>,
    user_id: Option<String>,
    consent: bool,
    online: bool,
}

struct Inner {
    config: AnalyticsConfig,
    storage: Arc<dyn Storage>,
    sink: Arc<dyn EventSink>,
    session_id: String,
    state: Mutex<QueueState>,
    /// Serialises flushes.
    flush_lock: tokio::sync::Mutex<()>,
    /// Wakes the flusher ahead of its interval. Shared with the flusher task,
    /// which does not keep `Inner` alive while it waits.
    wake: Arc<Notify>,
    shutdown: watch::Sender<bool>,
    flusher: Mutex<Option<JoinHandle<()>>>,
}

/// Consent-gated event queue with batched, retrying delivery.
///
/// Cloning is cheap; clones share one queue.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use marketplace::analytics::{Analytics, AnalyticsConfig, MemorySink, MemoryStorage};
///
/// # #[tokio::main]
/// # async fn main() {
/// let sink = Arc::new(MemorySink::new());
/// let analytics = Analytics::new(
///     AnalyticsConfig::default(),
///     Arc::new(MemoryStorage::new()),
///     sink.clone(),
/// );
/// analytics.track_page_view("/pricing", Some("Pricing"));
/// analytics.flush().await.unwrap();
/// assert_eq!(sink.events().len(), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct Analytics {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Analytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analytics")
            .field("session_id", &self.inner.session_id)
            .field("queued", &self.queue_len())
            .finish()
    }
}

/// Stored queue, oldest entries dropped down to `max`. The flag reports
/// whether storage no longer matches what was returned.
fn restore_queue(storage: &dyn Storage, max: usize) -> (VecDeque<AnalyticsEvent>, bool) {
    let raw = match storage.get_item(QUEUE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (VecDeque::new(), false),
        Err(e) => {
            warn!("Could not read stored analytics queue: {}", e);
            return (VecDeque::new(), true);
        }
    };
    let mut queue: VecDeque<AnalyticsEvent> = match serde_json::from_str(&raw) {
        Ok(queue) => queue,
        Err(e) => {
            warn!("Discarding unreadable analytics queue: {}", e);
            return (VecDeque::new(), true);
        }
    };
    let trimmed = queue.len() > max;
    while queue.len() > max {
        queue.pop_front();
    }
    (queue, trimmed)
}

/// A name the ingestion endpoint accepts. Blank names fall back to the event
/// type; long ones are cut, keeping the full text under `message`.
fn event_name(event_type: EventType, name: &str, properties: &mut Properties) -> String {
    let name = name.trim();
    if name.is_empty() {
        return event_type.as_str().to_string();
    }
    if name.chars().count() <= EVENT_NAME_MAX_LEN {
        return name.to_string();
    }
    if !properties.contains_key("message") {
        properties.insert("message".to_string(), json!(name));
    }
    name.chars().take(EVENT_NAME_MAX_LEN).collect()
}

fn restore_consent(storage: &dyn Storage) -> bool {
    match storage.get_item(CONSENT_KEY) {
        Ok(Some(value)) => value != CONSENT_DENIED,
        Ok(None) => true,
        Err(e) => {
            warn!("Could not read analytics consent: {}", e);
            true
        }
    }
}

impl Analytics {
    /// Build a pipeline, restoring consent and any queued events from `storage`.
    pub fn new(
        config: AnalyticsConfig,
        storage: Arc<dyn Storage>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let (queue, stale) = restore_queue(storage.as_ref(), config.effective_max_stored_events());
        let consent = restore_consent(storage.as_ref());
        if !queue.is_empty() {
            info!("Restored {} queued analytics events", queue.len());
        }
        let (shutdown, _) = watch::channel(false);

        let analytics = Self {
            inner: Arc::new(Inner {
                session_id: uuid::Uuid::new_v4().to_string(),
                state: Mutex::new(QueueState {
                    queue,
                    user_id: None,
                    consent,
                    online: true,
                }),
                config,
                storage,
                sink,
                flush_lock: tokio::sync::Mutex::new(()),
                wake: Arc::new(Notify::new()),
                shutdown,
                flusher: Mutex::new(None),
            }),
        };
        if stale {
            analytics.persist(&analytics.inner.state.lock().queue);
        }
        analytics
    }

    /// Pipeline configured from the environment, posting to the API.
    ///
    /// Uses a [`FileStorage`](super::FileStorage) when
    /// `ANALYTICS_STORAGE_PATH` is set.
    #[cfg(feature = "client")]
    pub fn from_env() -> Self {
        let config = AnalyticsConfig::from_env();
        let storage: Arc<dyn Storage> = match &config.storage_path {
            Some(path) => Arc::new(super::FileStorage::new(path)),
            None => Arc::new(MemoryStorage::new()),
        };
        let client = crate::client::ApiClient::new(config.api_url.clone());
        let sink = Arc::new(super::HttpSink::new(client));
        Self::new(config, storage, sink)
    }

    /// In-memory pipeline, handy for tests.
    pub fn in_memory(config: AnalyticsConfig, sink: Arc<dyn EventSink>) -> Self {
        Self::new(config, Arc::new(MemoryStorage::new()), sink)
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.inner.config
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn user_id(&self) -> Option<String> {
        self.inner.state.lock().user_id.clone()
    }

    pub fn has_consent(&self) -> bool {
        self.inner.state.lock().consent
    }

    pub fn is_online(&self) -> bool {
        self.inner.state.lock().online
    }

    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Snapshot of the queue, oldest first.
    pub fn queued_events(&self) -> Vec<AnalyticsEvent> {
        self.inner.state.lock().queue.iter().cloned().collect()
    }

    /// Whether a `track_*` call would currently record anything.
    pub fn is_tracking_allowed(&self) -> bool {
        let config = &self.inner.config;
        config.enabled && !config.blocked_by_do_not_track() && self.has_consent()
    }

    // ==================== Tracking ====================

    /// Record a custom event.
    pub fn track(&self, name: &str, properties: Properties) -> bool {
        self.record(EventType::Custom, name, properties)
    }

    pub fn track_page_view(&self, path: &str, title: Option<&str>) -> bool {
        let mut properties = Properties::new();
        properties.insert("path".to_string(), json!(path));
        if let Some(title) = title {
            properties.insert("title".to_string(), json!(title));
        }
        self.record(EventType::PageView, path, properties)
    }

    pub fn track_click(&self, element: &str, properties: Properties) -> bool {
        self.record(EventType::Click, element, properties)
    }

    pub fn track_form(&self, form: &str, action: &str, mut properties: Properties) -> bool {
        properties.insert("action".to_string(), json!(action));
        self.record(EventType::Form, form, properties)
    }

    /// Errors wake the flusher immediately.
    pub fn track_error(&self, message: &str, properties: Properties) -> bool {
        self.record(EventType::Error, message, properties)
    }

    pub fn track_performance(&self, metric: &str, value: f64) -> bool {
        let mut properties = Properties::new();
        properties.insert("value".to_string(), json!(value));
        self.record(EventType::Performance, metric, properties)
    }

    /// Attach `user_id` to this and all later events.
    pub fn identify(&self, user_id: &str, properties: Properties) -> bool {
        if !self.is_tracking_allowed() {
            return false;
        }
        self.inner.state.lock().user_id = Some(user_id.to_string());
        self.record(EventType::Identify, "identify", properties)
    }

    fn record(&self, event_type: EventType, name: &str, mut properties: Properties) -> bool {
        if !self.is_tracking_allowed() {
            return false;
        }

        let config = &self.inner.config;
        let name = event_name(event_type, name, &mut properties);
        let should_flush = {
            let mut state = self.inner.state.lock();
            let event = AnalyticsEvent::new(
                event_type,
                name.as_str(),
                properties,
                self.inner.session_id.as_str(),
                state.user_id.clone(),
            );
            if config.debug {
                debug!("[analytics] {} {} {}", event_type.as_str(), name, Value::Object(event.properties.clone()));
            }
            state.queue.push_back(event);
            while state.queue.len() > config.effective_max_stored_events() {
                if let Some(evicted) = state.queue.pop_front() {
                    debug!("Analytics queue full, dropped {}", evicted.id);
                }
            }
            self.persist(&state.queue);
            state.queue.len() >= config.effective_batch_size() || event_type == EventType::Error
        };

        if should_flush {
            self.inner.wake.notify_one();
        }
        true
    }

    fn persist(&self, queue: &VecDeque<AnalyticsEvent>) {
        let result = if queue.is_empty() {
            self.inner.storage.remove_item(QUEUE_KEY)
        } else {
            serde_json::to_string(queue)
                .map_err(AnalyticsError::from)
                .and_then(|raw| self.inner.storage.set_item(QUEUE_KEY, &raw))
        };
        if let Err(e) = result {
            warn!("Could not persist analytics queue: {}", e);
        }
    }

    // ==================== Consent & connectivity ====================

    /// Record the user's decision. Withdrawing consent discards the queue.
    pub fn set_consent(&self, granted: bool) {
        let mut state = self.inner.state.lock();
        state.consent = granted;
        let value = if granted { CONSENT_GRANTED } else { CONSENT_DENIED };
        if let Err(e) = self.inner.storage.set_item(CONSENT_KEY, value) {
            warn!("Could not persist analytics consent: {}", e);
        }
        if !granted {
            let dropped = state.queue.len();
            state.queue.clear();
            self.persist(&state.queue);
            info!("Analytics consent withdrawn, discarded {} events", dropped);
        }
    }

    /// While offline, flushes do nothing. Coming back online wakes the flusher.
    pub fn set_online(&self, online: bool) {
        let was_online = std::mem::replace(&mut self.inner.state.lock().online, online);
        if online && !was_online {
            self.inner.wake.notify_one();
        }
    }

    // ==================== Delivery ====================

    /// Send up to `batch_size` events from the head of the queue.
    ///
    /// Returns how many were delivered. On a retryable failure the events stay
    /// queued, in order, for the next attempt. A batch the sink rejects
    /// outright is dropped, since resending it can never succeed.
    pub async fn flush(&self) -> Result<usize, AnalyticsError> {
        let _guard = self.inner.flush_lock.lock().await;

        let batch: Vec<AnalyticsEvent> = {
            let state = self.inner.state.lock();
            if !state.online {
                return Ok(0);
            }
            state
                .queue
                .iter()
                .take(self.inner.config.effective_batch_size())
                .cloned()
                .collect()
        };
        if batch.is_empty() {
            return Ok(0);
        }

        let rejected = match self.inner.sink.send(&batch).await {
            Ok(()) => None,
            Err(AnalyticsError::Rejected(reason)) => {
                warn!(
                    "Dropping {} analytics events the sink rejected: {}",
                    batch.len(),
                    reason
                );
                Some(reason)
            }
            Err(e) => {
                warn!(
                    "Analytics flush of {} events failed, keeping them queued: {}",
                    batch.len(),
                    e
                );
                return Err(e);
            }
        };

        let sent: HashSet<&str> = batch.iter().map(|e| e.id.as_str()).collect();
        let remaining = {
            let mut state = self.inner.state.lock();
            state.queue.retain(|e| !sent.contains(e.id.as_str()));
            self.persist(&state.queue);
            state.queue.len()
        };
        if let Some(reason) = rejected {
            return Err(AnalyticsError::Rejected(reason));
        }
        debug!("Flushed {} analytics events, {} remaining", batch.len(), remaining);
        Ok(batch.len())
    }

    /// Flush until the queue is empty, the sink fails or we are offline.
    /// Rejected batches are skipped; the count covers delivered events only.
    pub async fn flush_all(&self) -> Result<usize, AnalyticsError> {
        let mut total = 0;
        loop {
            match self.flush().await {
                Ok(0) => return Ok(total),
                Ok(sent) => total += sent,
                Err(AnalyticsError::Rejected(_)) => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Start the background flusher. Returns `false` if one is already running.
    ///
    /// The task flushes every `batch_interval` and whenever a full batch or an
    /// error event is queued. It holds only a weak reference while waiting, so
    /// dropping every `Analytics` handle also ends it.
    pub fn spawn_flusher(&self) -> bool {
        let mut slot = self.inner.flusher.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let wake = Arc::clone(&self.inner.wake);
        let mut shutdown = self.inner.shutdown.subscribe();
        let interval = self.inner.config.effective_batch_interval();

        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                // Closed when the last handle drops `Inner`.
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = wake.notified() => {}
                    _ = shutdown.changed() => break,
                }
                let Some(inner) = weak.upgrade() else { break };
                let analytics = Analytics { inner };
                let batch_size = analytics.config().effective_batch_size();
                match analytics.flush().await {
                    Ok(sent) if sent > 0 && analytics.queue_len() >= batch_size => {
                        wake.notify_one();
                    }
                    Ok(_) => {}
                    Err(e) => debug!("Background flush failed: {}", e),
                }
            }
            debug!("Analytics flusher stopped");
        }));
        true
    }

    /// Stop the flusher and make a final delivery attempt.
    pub async fn shutdown(&self) -> Result<usize, AnalyticsError> {
        let _ = self.inner.shutdown.send(true);
        let handle = self.inner.flusher.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Analytics flusher ended abnormally: {}", e);
            }
        }
        self.flush_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::MemorySink;
    use std::time::Duration;

    fn pipeline(config: AnalyticsConfig) -> (Analytics, Arc<MemorySink>, Arc<MemoryStorage>) {
        let sink = Arc::new(MemorySink::new());
        let storage = Arc::new(MemoryStorage::new());
        let analytics = Analytics::new(config, storage.clone(), sink.clone());
        (analytics, sink, storage)
    }

    fn stored_len(storage: &MemoryStorage) -> usize {
        storage
            .get_item(QUEUE_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str::<Vec<AnalyticsEvent>>(&raw).unwrap().len())
            .unwrap_or(0)
    }

    #[test]
    fn test_disabled_pipeline_records_nothing() {
        let (analytics, _, storage) = pipeline(AnalyticsConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(!analytics.track("signup", Properties::new()));
        assert_eq!(analytics.queue_len(), 0);
        assert_eq!(stored_len(&storage), 0);
    }

    #[test]
    fn test_do_not_track_blocks_events() {
        let (analytics, _, _) = pipeline(AnalyticsConfig {
            do_not_track: true,
            ..Default::default()
        });
        assert!(!analytics.track_click("cta", Properties::new()));
    }

    #[test]
    fn test_queue_capped_with_fifo_eviction() {
        let (analytics, _, storage) =
            pipeline(AnalyticsConfig::default().with_max_stored_events(3).with_batch_size(50));
        for i in 0..5 {
            analytics.track(&format!("e{}", i), Properties::new());
        }
        let names: Vec<_> = analytics
            .queued_events()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["e2", "e3", "e4"]);
        assert_eq!(stored_len(&storage), 3);
    }

    #[test]
    fn test_withdrawing_consent_clears_queue_and_storage() {
        let (analytics, _, storage) = pipeline(AnalyticsConfig::default());
        analytics.track("a", Properties::new());
        analytics.set_consent(false);
        assert_eq!(analytics.queue_len(), 0);
        assert_eq!(storage.get_item(QUEUE_KEY).unwrap(), None);
        assert_eq!(
            storage.get_item(CONSENT_KEY).unwrap().as_deref(),
            Some(CONSENT_DENIED)
        );
        assert!(!analytics.track("b", Properties::new()));

        // Consent survives a restart.
        let restored = Analytics::new(
            AnalyticsConfig::default(),
            storage.clone(),
            Arc::new(MemorySink::new()),
        );
        assert!(!restored.has_consent());
    }

    #[test]
    fn test_identify_tags_later_events() {
        let (analytics, _, _) = pipeline(AnalyticsConfig::default());
        analytics.track("before", Properties::new());
        analytics.identify("user-7", Properties::new());
        analytics.track("after", Properties::new());

        let events = analytics.queued_events();
        assert_eq!(events[0].user_id, None);
        assert_eq!(events[1].event_type, EventType::Identify);
        assert_eq!(events[2].user_id.as_deref(), Some("user-7"));
        assert!(events.iter().all(|e| e.session_id == analytics.session_id()));
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_order() {
        let (analytics, sink, storage) = pipeline(AnalyticsConfig::default().with_batch_size(2));
        for name in ["a", "b", "c"] {
            analytics.track(name, Properties::new());
        }

        sink.set_failing(true);
        assert!(analytics.flush().await.is_err());
        assert_eq!(analytics.queue_len(), 3);
        assert_eq!(stored_len(&storage), 3);

        sink.set_failing(false);
        assert_eq!(analytics.flush_all().await.unwrap(), 3);
        let names: Vec<_> = sink.events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(sink.batches().len(), 2);
        assert_eq!(storage.get_item(QUEUE_KEY).unwrap(), None);
    }

    #[test]
    fn test_names_fit_the_ingestion_limit() {
        let (analytics, _, _) = pipeline(AnalyticsConfig::default());
        let message = format!("TypeError: {}", "cannot read properties of undefined ".repeat(4));
        assert!(message.chars().count() > EVENT_NAME_MAX_LEN);

        analytics.track_error(&message, Properties::new());
        analytics.track("   ", Properties::new());

        let events = analytics.queued_events();
        assert_eq!(events[0].name.chars().count(), EVENT_NAME_MAX_LEN);
        assert!(message.starts_with(&events[0].name));
        assert_eq!(events[0].properties["message"], message.trim());
        assert_eq!(events[1].name, "custom");
    }

    #[tokio::test]
    async fn test_rejected_batch_is_dropped_not_retried() {
        let (analytics, sink, storage) = pipeline(AnalyticsConfig::default().with_batch_size(2));
        for name in ["bad-1", "bad-2", "good"] {
            analytics.track(name, Properties::new());
        }

        sink.set_rejecting(true);
        assert!(matches!(
            analytics.flush().await,
            Err(AnalyticsError::Rejected(_))
        ));
        assert_eq!(analytics.queue_len(), 1);
        assert_eq!(stored_len(&storage), 1);

        sink.set_rejecting(false);
        assert_eq!(analytics.flush_all().await.unwrap(), 1);
        assert_eq!(sink.events()[0].name, "good");
    }

    #[tokio::test]
    async fn test_flush_all_skips_rejected_batches() {
        let (analytics, sink, _) = pipeline(AnalyticsConfig::default().with_batch_size(1));
        analytics.track("a", Properties::new());
        analytics.track("b", Properties::new());
        sink.set_rejecting(true);
        assert_eq!(analytics.flush_all().await.unwrap(), 0);
        assert_eq!(analytics.queue_len(), 0);
    }

    #[test]
    fn test_restore_with_smaller_cap_rewrites_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let first = Analytics::new(
            AnalyticsConfig::default().with_batch_size(50),
            storage.clone(),
            Arc::new(MemorySink::new()),
        );
        for i in 0..5 {
            first.track(&format!("e{}", i), Properties::new());
        }
        drop(first);
        assert_eq!(stored_len(&storage), 5);

        let second = Analytics::new(
            AnalyticsConfig::default().with_max_stored_events(3),
            storage.clone(),
            Arc::new(MemorySink::new()),
        );
        let names: Vec<_> = second.queued_events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["e2", "e3", "e4"]);
        assert_eq!(stored_len(&storage), 3);
    }

    #[tokio::test]
    async fn test_zeroed_struct_literal_still_delivers() {
        let (analytics, sink, _) = pipeline(AnalyticsConfig {
            batch_size: 0,
            max_stored_events: 0,
            batch_interval: Duration::ZERO,
            ..Default::default()
        });
        assert!(analytics.spawn_flusher());
        analytics.track("only", Properties::new());
        assert_eq!(analytics.queue_len(), 1);
        analytics.shutdown().await.unwrap();
        assert_eq!(sink.events().len(), 1);
        assert_eq!(analytics.queue_len(), 0);
    }

    #[tokio::test]
    async fn test_flusher_does_not_keep_pipeline_alive() {
        let (analytics, _, _) = pipeline(
            AnalyticsConfig::default().with_batch_interval(Duration::from_secs(3600)),
        );
        analytics.spawn_flusher();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        let weak = Arc::downgrade(&analytics.inner);
        drop(analytics);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_offline_flush_is_noop() {
        let (analytics, sink, _) = pipeline(AnalyticsConfig::default());
        analytics.track("a", Properties::new());
        analytics.set_online(false);
        assert_eq!(analytics.flush().await.unwrap(), 0);
        assert!(sink.events().is_empty());
        analytics.set_online(true);
        assert_eq!(analytics.flush().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_queue_restored_from_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let first = Analytics::new(
            AnalyticsConfig::default(),
            storage.clone(),
            Arc::new(MemorySink::new()),
        );
        first.track("persisted", Properties::new());
        drop(first);

        let sink = Arc::new(MemorySink::new());
        let second = Analytics::new(AnalyticsConfig::default(), storage, sink.clone());
        assert_eq!(second.queue_len(), 1);
        second.flush().await.unwrap();
        assert_eq!(sink.events()[0].name, "persisted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_event_wakes_flusher() {
        let (analytics, sink, _) = pipeline(
            AnalyticsConfig::default().with_batch_interval(Duration::from_secs(3600)),
        );
        assert!(analytics.spawn_flusher());
        assert!(!analytics.spawn_flusher());

        analytics.track_error("TypeError: x is undefined", Properties::new());
        for _ in 0..10 {
            if !sink.events().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sink.events()[0].event_type, EventType::Error);
        analytics.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_flush_and_shutdown_drain() {
        let (analytics, sink, _) = pipeline(
            AnalyticsConfig::default().with_batch_interval(Duration::from_secs(5)),
        );
        analytics.spawn_flusher();
        analytics.track("tick", Properties::new());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(sink.events().len(), 1);

        analytics.track("late", Properties::new());
        analytics.shutdown().await.unwrap();
        assert_eq!(sink.events().len(), 2);
    }
}
