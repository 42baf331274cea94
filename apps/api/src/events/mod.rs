//! Best-effort analytics. Recording never fails from the caller's side:
//! a primary sink failure falls through to the fallback sink, and a
//! fallback failure is only traced.

pub mod sinks;

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::models::event::{Event, EventLogEntry};

pub use sinks::{EventSink, LocalBufferSink, StoreSink};

#[derive(Clone)]
pub struct EventLogger {
    primary: Arc<dyn EventSink>,
    fallback: Arc<dyn EventSink>,
    user_agent: Arc<str>,
    user_id: Option<Uuid>,
}

impl EventLogger {
    pub fn new(
        primary: Arc<dyn EventSink>,
        fallback: Arc<dyn EventSink>,
        user_agent: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            primary,
            fallback,
            user_agent: user_agent.into(),
            user_id: None,
        }
    }

    /// A logger that attributes its events to `user_id` and the client's
    /// user agent. The configured agent is kept when the client sent none.
    pub fn for_user(&self, user_id: Option<Uuid>, user_agent: Option<&str>) -> Self {
        Self {
            user_id,
            user_agent: user_agent.map_or_else(|| self.user_agent.clone(), Arc::from),
            ..self.clone()
        }
    }

    fn enrich(&self, event: Event) -> EventLogEntry {
        EventLogEntry {
            user_id: self.user_id,
            event_type: event.event_type,
            event_data: event.event_data,
            user_agent: self.user_agent.to_string(),
            created_at: Utc::now(),
        }
    }

    pub async fn log_event(&self, event: Event) {
        let entry = self.enrich(event);
        debug!(event_type = %entry.event_type, "Event logged");

        let Err(primary_err) = self.primary.record(&entry).await else {
            return;
        };
        warn!(
            event_type = %entry.event_type,
            "Event sink failed, buffering locally: {primary_err}"
        );
        if let Err(e) = self.fallback.record(&entry).await {
            error!(event_type = %entry.event_type, "Failed to log event: {e}");
        }
    }

    /// Records `user_<action>`.
    pub async fn log_user_action(&self, action: &str, data: Value) {
        self.log_event(Event::new(format!("user_{action}"), data))
            .await;
    }

    pub async fn log_api_call(&self, endpoint: &str, method: &str, status: u16, data: Value) {
        let mut event_data = json!({
            "endpoint": endpoint,
            "method": method,
            "status": status,
        });
        if let (Some(base), Value::Object(extra)) = (event_data.as_object_mut(), data) {
            base.extend(extra);
        }
        self.log_event(Event::new("api_call", event_data)).await;
    }

    pub async fn log_error(&self, message: &str, context: Value) {
        self.log_event(Event::new(
            "error",
            json!({ "error": message, "context": context }),
        ))
        .await;
    }
}
