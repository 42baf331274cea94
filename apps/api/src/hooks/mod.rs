//! Data hooks: thin request/response wrappers the dashboard composes.
//! No caching or invalidation; callers refetch on demand.

pub mod platform;
pub mod store_data;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use platform::PlatformApi;
pub use store_data::StoreData;

/// Shared "request in flight" flag. Cloning shares the flag.
#[derive(Clone, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sets the flag until the returned guard is dropped.
    pub fn begin(&self) -> LoadingGuard {
        self.0.store(true, Ordering::SeqCst);
        LoadingGuard(self.0.clone())
    }
}

pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
