use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::event::EventLogEntry;
use crate::store::Store;

/// Destination for enriched event log entries.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn record(&self, entry: &EventLogEntry) -> Result<(), AppError>;
}

/// Writes to the store's `event_logs` table.
pub struct StoreSink {
    store: Arc<dyn Store>,
}

impl StoreSink {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventSink for StoreSink {
    async fn record(&self, entry: &EventLogEntry) -> Result<(), AppError> {
        self.store.insert_event(entry).await
    }
}

/// Bounded in-process buffer. The oldest entry is dropped once full.
pub struct LocalBufferSink {
    capacity: usize,
    entries: Mutex<VecDeque<EventLogEntry>>,
}

impl LocalBufferSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn buffered(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn entries(&self) -> Vec<EventLogEntry> {
        self.entries
            .lock()
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for LocalBufferSink {
    async fn record(&self, entry: &EventLogEntry) -> Result<(), AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal(anyhow!("event buffer lock poisoned")))?;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
        Ok(())
    }
}
