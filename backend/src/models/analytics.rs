//! Analytics event records shared by the client pipeline and the ingestion API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form event properties.
pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    Click,
    Form,
    Error,
    Performance,
    Identify,
    Custom,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PageView => "page_view",
            EventType::Click => "click",
            EventType::Form => "form",
            EventType::Error => "error",
            EventType::Performance => "performance",
            EventType::Identify => "identify",
            EventType::Custom => "custom",
        }
    }
}

/// A single tracked interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl AnalyticsEvent {
    /// New event stamped with a fresh id and the current time.
    pub fn new(
        event_type: EventType,
        name: impl Into<String>,
        properties: Properties,
        session_id: impl Into<String>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            name: name.into(),
            properties,
            timestamp: Utc::now(),
            session_id: session_id.into(),
            user_id,
        }
    }
}

/// Wire body for `POST /v1/analytics/events`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<AnalyticsEvent>,
}

/// An event as kept by the server after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    #[serde(flatten)]
    pub event: AnalyticsEvent,
    pub received_at: DateTime<Utc>,
}

/// Per-type counts over everything ingested so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total: usize,
    pub by_type: std::collections::BTreeMap<EventType, usize>,
    pub sessions: usize,
}
