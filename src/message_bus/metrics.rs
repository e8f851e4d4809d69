use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for result bus traffic
#[derive(Debug, Clone, Default)]
pub struct BusMetrics {
    published: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    ignored_foreign: Arc<AtomicU64>,
}

impl BusMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_published(&self) {
        self.published.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn increment_ignored_foreign(&self) {
        self.ignored_foreign.fetch_add(1, Ordering::SeqCst);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            published: self.published.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
            ignored_foreign: self.ignored_foreign.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Results handed to at least one listener
    pub published: u64,
    /// Results published while nobody listened
    pub dropped: u64,
    /// Results a listener skipped because they came from another context
    pub ignored_foreign: u64,
}
