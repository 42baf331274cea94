use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::Mutex as AsyncMutex;

use super::Dashboard;

pub type SharedDashboard = Arc<AsyncMutex<Dashboard>>;

/// Dashboards untouched for this long are dropped on the next lookup.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry {
    dashboard: SharedDashboard,
    last_used: Instant,
}

/// Live dashboards keyed by access token. Each dashboard sits behind its own
/// async mutex so one user's actions run one at a time.
#[derive(Clone)]
pub struct DashboardSessions {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
    idle_ttl: Duration,
}

impl Default for DashboardSessions {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TTL)
    }
}

impl DashboardSessions {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            idle_ttl,
        }
    }

    /// Also evicts other dashboards that sat idle past the TTL. A dashboard
    /// still held by an in-flight request is never evicted.
    pub fn get_or_insert_with(
        &self,
        access_token: &str,
        create: impl FnOnce() -> Dashboard,
    ) -> SharedDashboard {
        let mut sessions = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let idle_ttl = self.idle_ttl;
        sessions.retain(|token, entry| {
            token == access_token
                || Arc::strong_count(&entry.dashboard) > 1
                || entry.last_used.elapsed() < idle_ttl
        });

        let entry = sessions
            .entry(access_token.to_string())
            .or_insert_with(|| Entry {
                dashboard: Arc::new(AsyncMutex::new(create())),
                last_used: Instant::now(),
            });
        entry.last_used = Instant::now();
        entry.dashboard.clone()
    }

    pub fn remove(&self, access_token: &str) -> Option<SharedDashboard> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(access_token)
            .map(|entry| entry.dashboard)
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
