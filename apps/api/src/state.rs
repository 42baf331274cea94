use std::sync::Arc;

use crate::config::Config;
use crate::dashboard::sessions::DashboardSessions;
use crate::events::{EventLogger, LocalBufferSink};
use crate::proxy::transport::ProxyTransport;
use crate::store::Store;
use crate::youtube::VideoPlatform;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    /// Platform client behind the proxy endpoint. Holds the server-side API key.
    pub platform: Arc<dyn VideoPlatform>,
    /// How dashboards reach the proxy: in-process, or over HTTP when `PROXY_URL` is set.
    pub transport: Arc<dyn ProxyTransport>,
    pub events: EventLogger,
    /// Fallback sink of `events`; exposed for the health report.
    pub event_buffer: Arc<LocalBufferSink>,
    pub dashboards: DashboardSessions,
    pub config: Config,
}
