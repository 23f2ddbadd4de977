//! Metrics hooks for the query cache.
//!
//! Implement [`CacheMetrics`] to forward cache activity to a monitoring
//! system. Every method has a default body that logs through the `log` crate,
//! so an implementation only overrides what it cares about.
//!
//! ```ignore
//! use gallery_kit::observability::CacheMetrics;
//! use std::time::Duration;
//!
//! struct LoadTimer;
//!
//! impl CacheMetrics for LoadTimer {
//!     fn record_load(&self, key: &str, duration: Duration) {
//!         // histogram!("gallery_load_seconds").record(duration);
//!     }
//! }
//!
//! let cache = QueryCache::with_metrics(Box::new(LoadTimer));
//! ```
//!
//! | Hook | Fired when |
//! |------|-----------|
//! | `record_hit` | `fetch` served a fresh cached value |
//! | `record_miss` | `fetch` had to call the loader |
//! | `record_dedup` | `fetch` joined a request already in flight |
//! | `record_load` | a loader settled successfully |
//! | `record_invalidate` | `invalidate` marked entries stale |
//! | `record_error` | a loader or decode failed |

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    fn record_hit(&self, key: &str) {
        debug!("Query HIT: {}", key);
    }

    fn record_miss(&self, key: &str) {
        debug!("Query MISS: {}", key);
    }

    fn record_dedup(&self, key: &str) {
        debug!("Query JOIN in-flight: {}", key);
    }

    fn record_load(&self, key: &str, duration: Duration) {
        debug!("Query LOAD: {} took {:?}", key, duration);
    }

    fn record_invalidate(&self, matched: usize) {
        debug!("Query INVALIDATE: {} entries", matched);
    }

    fn record_error(&self, key: &str, error: &str) {
        warn!("Query ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str) {}
    fn record_miss(&self, _key: &str) {}
    fn record_dedup(&self, _key: &str) {}
    fn record_load(&self, _key: &str, _duration: Duration) {}
    fn record_invalidate(&self, _matched: usize) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics implementation that only logs, using the trait defaults.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}
