use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A caller-supplied analytics event before enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub event_data: Value,
}

impl Event {
    pub fn new(event_type: impl Into<String>, event_data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            event_data,
        }
    }
}

/// An enriched, write-once event log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub user_id: Option<Uuid>,
    pub event_type: String,
    pub event_data: Value,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}
