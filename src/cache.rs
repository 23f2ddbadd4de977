//! Process-wide query cache with request de-duplication.
//!
//! [`QueryCache`] maps a [`QueryKey`] to the last result of its loader. It is
//! cheap to clone (one `Arc`) and is injected into every controller, so tests
//! build an isolated instance per case.
//!
//! - `fetch` serves a fresh entry, joins a request already in flight for the
//!   same key, or starts the loader. At most one loader runs per key.
//! - `prefetch` starts the same work on a background task and returns
//!   immediately. Its errors are logged, never surfaced.
//! - `invalidate` marks matching entries stale. The next `fetch` reloads them
//!   while `get` keeps returning the previous value.
//!
//! Loader failures are stored on the entry and returned from `fetch`; none of
//! the cache-management calls fail.

use crate::error::{Error, Result};
use crate::key::{KeyPredicate, QueryKey};
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use crate::strategy::FetchStrategy;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Settled or pending outcome of one loader run, shared by every waiter.
type Pending = Shared<BoxFuture<'static, Result<Arc<[u8]>>>>;

#[derive(Default)]
struct Slot {
    value: Option<Arc<[u8]>>,
    error: Option<Error>,
    stale: bool,
    in_flight: Option<Pending>,
    updated_at: Option<Instant>,
}

impl Slot {
    fn fresh_value(&self) -> Option<&Arc<[u8]>> {
        if self.stale || self.error.is_some() {
            return None;
        }
        self.value.as_ref()
    }
}

enum Lookup {
    Hit(Arc<[u8]>),
    Join(Pending),
    Start(Pending, Instant),
}

/// Snapshot of one cache entry, decoded as `T`.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// Last successful result, if any and if it decodes as `T`.
    pub value: Option<T>,
    /// Error of the last settled load (or of decoding `value`).
    pub error: Option<Error>,
    /// Set by invalidation; cleared by the next successful load.
    pub is_stale: bool,
    /// A loader is running for this key.
    pub is_fetching: bool,
    /// When `value` was stored.
    pub updated_at: Option<Instant>,
}

impl<T> CacheEntry<T> {
    /// A `fetch` for this key would be served without calling the loader.
    pub fn is_fresh(&self) -> bool {
        self.value.is_some() && self.error.is_none() && !self.is_stale
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub stale_entries: usize,
    pub failed_entries: usize,
    pub in_flight: usize,
    pub total_bytes: usize,
}

struct Inner {
    slots: DashMap<QueryKey, Slot>,
    metrics: Box<dyn CacheMetrics>,
}

/// Keyed cache of API query results.
///
/// # Example
///
/// ```ignore
/// use gallery_kit::{QueryCache, QueryKey};
///
/// let cache = QueryCache::new();
/// let key = QueryKey::new("albums").param("page", 1);
/// let albums: PageData<Album> = cache.fetch(&key, || load_albums(window)).await?;
/// ```
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::with_metrics(Box::new(NoOpMetrics))
    }

    /// Create an empty cache reporting to custom metrics.
    pub fn with_metrics(metrics: Box<dyn CacheMetrics>) -> Self {
        QueryCache {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                metrics,
            }),
        }
    }

    /// Look up an entry without side effects.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        let slot = self.inner.slots.get(key)?;

        let (value, decode_error) = match slot.value.as_deref().map(deserialize_from_cache::<T>) {
            Some(Ok(v)) => (Some(v), None),
            Some(Err(e)) => (None, Some(e)),
            None => (None, None),
        };

        Some(CacheEntry {
            value,
            error: slot.error.clone().or(decode_error),
            is_stale: slot.stale,
            is_fetching: slot.in_flight.is_some(),
            updated_at: slot.updated_at,
        })
    }

    /// Serve `key` from cache when fresh, otherwise run `loader` once.
    ///
    /// Concurrent calls for the same key share one loader run and resolve
    /// with the same outcome.
    ///
    /// # Errors
    ///
    /// Returns the loader's error, or `Error::Deserialization` when the entry
    /// was stored under a different type.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.fetch_with(key, FetchStrategy::Refresh, loader).await
    }

    /// Fetch with an explicit [`FetchStrategy`].
    ///
    /// # Errors
    ///
    /// As [`fetch`](Self::fetch); `Fresh` returns `Error::CacheMiss` when no
    /// value is cached.
    pub async fn fetch_with<T, F, Fut>(
        &self,
        key: &QueryKey,
        strategy: FetchStrategy,
        loader: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        debug!("» Query {} (strategy: {})", key, strategy);

        match strategy {
            FetchStrategy::Bypass => return loader().await,
            FetchStrategy::Fresh => {
                return match self.get::<T>(key) {
                    Some(CacheEntry { value: Some(v), .. }) => Ok(v),
                    Some(CacheEntry { error: Some(e), .. }) if e.is_cache_decode() => Err(e),
                    _ => Err(Error::CacheMiss),
                };
            }
            FetchStrategy::Invalidate => {
                self.invalidate(&KeyPredicate::Exact(key.clone()));
            }
            FetchStrategy::Refresh => {}
        }

        let mut loader = Some(loader);
        loop {
            match self.begin(key, &mut loader) {
                Lookup::Hit(bytes) => match deserialize_from_cache::<T>(&bytes) {
                    Ok(value) => {
                        self.inner.metrics.record_hit(&key.to_string());
                        return Ok(value);
                    }
                    Err(e) if e.is_cache_decode() && loader.is_some() => {
                        warn!("Dropping undecodable entry {}: {}", key, e);
                        self.drop_value(key, &bytes);
                    }
                    Err(e) => return Err(e),
                },
                Lookup::Join(pending) => {
                    self.inner.metrics.record_dedup(&key.to_string());
                    return self.wait(key, pending, None).await;
                }
                Lookup::Start(pending, started) => {
                    self.inner.metrics.record_miss(&key.to_string());
                    return self.wait(key, pending, Some(started)).await;
                }
            }
        }
    }

    /// Start loading `key` in the background unless it is fresh or already
    /// loading.
    ///
    /// The result lands in the cache for a later `fetch`/`get`. Failures are
    /// logged and dropped. Outside a Tokio runtime this is a no-op.
    pub fn prefetch<T, F, Fut>(&self, key: QueryKey, loader: F)
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("Prefetch of {} skipped: no async runtime", key);
            return;
        };

        let mut loader = Some(loader);
        if let Lookup::Start(pending, started) = self.begin(&key, &mut loader) {
            debug!("Prefetching {}", key);
            let cache = self.clone();
            handle.spawn(async move {
                let outcome = pending.clone().await;
                cache.settle(&key, &pending, &outcome, Some(started));
                if let Err(e) = outcome {
                    warn!("Prefetch of {} failed: {}", key, e);
                }
            });
        }
    }

    /// Mark every entry matched by `predicate` as stale.
    ///
    /// A load in flight for a matched key is detached: its waiters still get
    /// its outcome, but it is not stored, and the next `fetch` reloads.
    /// Returns the number of entries matched.
    pub fn invalidate(&self, predicate: &KeyPredicate) -> usize {
        let mut matched = 0;
        for mut slot in self.inner.slots.iter_mut() {
            if predicate.matches(slot.key()) {
                slot.stale = true;
                slot.in_flight = None;
                matched += 1;
            }
        }

        debug!("Invalidated {} entries matching {:?}", matched, predicate);
        self.inner.metrics.record_invalidate(matched);
        matched
    }

    /// Invalidate with an ad-hoc closure.
    pub fn invalidate_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&QueryKey) -> bool + Send + Sync + 'static,
    {
        self.invalidate(&KeyPredicate::custom(predicate))
    }

    /// Store `value` under `key` as a fresh entry.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if the value cannot be encoded.
    pub fn set<T: Serialize>(&self, key: QueryKey, value: &T) -> Result<()> {
        let bytes: Arc<[u8]> = serialize_for_cache(value)?.into();
        let mut slot = self.inner.slots.entry(key).or_default();
        slot.value = Some(bytes);
        slot.error = None;
        slot.stale = false;
        slot.in_flight = None;
        slot.updated_at = Some(Instant::now());
        Ok(())
    }

    /// Remove one entry. Returns whether it existed.
    pub fn remove(&self, key: &QueryKey) -> bool {
        self.inner.slots.remove(key).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.inner.slots.clear();
        debug!("Query cache cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    /// Keys currently held, sorted.
    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self.inner.slots.iter().map(|s| s.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Whether a loader is running for `key`.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .slots
            .get(key)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .slots
            .iter()
            .fold(CacheStats::default(), |mut stats, slot| {
                stats.total_entries += 1;
                stats.stale_entries += usize::from(slot.stale);
                stats.failed_entries += usize::from(slot.error.is_some());
                stats.in_flight += usize::from(slot.in_flight.is_some());
                stats.total_bytes += slot.value.as_ref().map_or(0, |v| v.len());
                stats
            })
    }

    /// Log cache statistics at debug level.
    pub fn log_stats(&self) {
        let stats = self.stats();
        debug!(
            "Query cache: {} entries ({} stale, {} failed, {} loading), {} bytes",
            stats.total_entries,
            stats.stale_entries,
            stats.failed_entries,
            stats.in_flight,
            stats.total_bytes
        );
    }

    // ------------------------------------------------------------------------

    /// Decide under the entry lock whether to serve, join or start a load.
    fn begin<T, F, Fut>(&self, key: &QueryKey, loader: &mut Option<F>) -> Lookup
    where
        T: Serialize + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut slot = self.inner.slots.entry(key.clone()).or_default();

        if let Some(bytes) = slot.fresh_value() {
            return Lookup::Hit(bytes.clone());
        }
        if let Some(pending) = &slot.in_flight {
            return Lookup::Join(pending.clone());
        }

        let pending = match loader.take() {
            Some(loader) => Self::load_shared(loader()),
            None => futures::future::ready(Err(Error::Other(format!(
                "loader for {} already consumed",
                key
            ))))
            .boxed()
            .shared(),
        };
        slot.in_flight = Some(pending.clone());
        Lookup::Start(pending, Instant::now())
    }

    fn load_shared<T, Fut>(load: Fut) -> Pending
    where
        T: Serialize + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        async move {
            let value = load.await?;
            serialize_for_cache(&value).map(Arc::from)
        }
        .boxed()
        .shared()
    }

    async fn wait<T: DeserializeOwned>(
        &self,
        key: &QueryKey,
        pending: Pending,
        started: Option<Instant>,
    ) -> Result<T> {
        let outcome = pending.clone().await;
        self.settle(key, &pending, &outcome, started);
        outcome.and_then(|bytes| deserialize_from_cache(&bytes))
    }

    /// Store a load outcome if `pending` is still the entry's current load.
    ///
    /// Every waiter calls this; only the first one to arrive writes. A load
    /// detached by `invalidate` never writes.
    fn settle(
        &self,
        key: &QueryKey,
        pending: &Pending,
        outcome: &Result<Arc<[u8]>>,
        started: Option<Instant>,
    ) {
        let Some(mut slot) = self.inner.slots.get_mut(key) else {
            return;
        };
        if !slot.in_flight.as_ref().is_some_and(|p| p.ptr_eq(pending)) {
            return;
        }

        slot.in_flight = None;
        match outcome {
            Ok(bytes) => {
                slot.value = Some(bytes.clone());
                slot.error = None;
                slot.stale = false;
                slot.updated_at = Some(Instant::now());
                if let Some(started) = started {
                    self.inner
                        .metrics
                        .record_load(&key.to_string(), started.elapsed());
                }
            }
            Err(e) => {
                slot.error = Some(e.clone());
                self.inner.metrics.record_error(&key.to_string(), &e.to_string());
            }
        }
    }

    fn drop_value(&self, key: &QueryKey, bytes: &Arc<[u8]>) {
        if let Some(mut slot) = self.inner.slots.get_mut(key) {
            if slot.value.as_ref().is_some_and(|v| Arc::ptr_eq(v, bytes)) {
                slot.value = None;
            }
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn counting_loader(
        calls: &Arc<AtomicUsize>,
        value: Vec<String>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<String>>> {
        let calls = calls.clone();
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    fn key(page: u32) -> QueryKey {
        QueryKey::new("albums").param("page", page)
    }

    #[tokio::test]
    async fn test_fetch_populates_then_hits() {
        let cache = QueryCache::new();
        let calls = counter();

        let first: Vec<String> = cache
            .fetch(&key(1), counting_loader(&calls, vec!["a".into()]))
            .await
            .expect("first fetch");
        let second: Vec<String> = cache
            .fetch(&key(1), counting_loader(&calls, vec!["b".into()]))
            .await
            .expect("second fetch");

        assert_eq!(first, vec!["a".to_string()]);
        assert_eq!(second, first);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_has_no_side_effects() {
        let cache = QueryCache::new();
        assert!(cache.get::<Vec<String>>(&key(1)).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_load() {
        let cache = QueryCache::new();
        let calls = counter();

        let k = key(1);
        let (a, b) = tokio::join!(
            cache.fetch(&k, counting_loader(&calls, vec!["x".into()])),
            cache.fetch(&k, counting_loader(&calls, vec!["y".into()])),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.expect("a"), vec!["x".to_string()]);
        assert_eq!(b.expect("b"), vec!["x".to_string()]);
        assert!(!cache.is_fetching(&key(1)));
    }

    #[tokio::test]
    async fn test_concurrent_failures_are_shared() {
        let cache = QueryCache::new();
        let calls = counter();

        let failing = |calls: Arc<AtomicUsize>| {
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err::<Vec<String>, _>(Error::Network("connection reset".into()))
            }
        };

        let k = key(1);
        let (a, b) = tokio::join!(
            cache.fetch(&k, failing(calls.clone())),
            cache.fetch(&k, failing(calls.clone())),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap_err(), Error::Network("connection reset".into()));
        assert_eq!(b.unwrap_err(), Error::Network("connection reset".into()));

        let entry = cache.get::<Vec<String>>(&key(1)).expect("entry exists");
        assert!(entry.error.is_some());
        assert!(!entry.is_fresh());
    }

    #[tokio::test]
    async fn test_failed_entry_reloads_on_next_fetch() {
        let cache = QueryCache::new();
        let result: Result<Vec<String>> = cache
            .fetch(&key(1), || async { Err(Error::Network("down".into())) })
            .await;
        assert!(result.is_err());

        let calls = counter();
        let value: Vec<String> = cache
            .fetch(&key(1), counting_loader(&calls, vec!["ok".into()]))
            .await
            .expect("recovered");
        assert_eq!(value, vec!["ok".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.get::<Vec<String>>(&key(1)).unwrap().error.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_reload_and_keeps_stale_value() {
        let cache = QueryCache::new();
        let calls = counter();

        let _: Vec<String> = cache
            .fetch(&key(1), counting_loader(&calls, vec!["old".into()]))
            .await
            .unwrap();

        assert_eq!(cache.invalidate(&KeyPredicate::resource("albums")), 1);

        let entry = cache.get::<Vec<String>>(&key(1)).unwrap();
        assert!(entry.is_stale);
        assert_eq!(entry.value, Some(vec!["old".to_string()]));

        let fresh: Vec<String> = cache
            .fetch(&key(1), counting_loader(&calls, vec!["new".into()]))
            .await
            .unwrap();
        assert_eq!(fresh, vec!["new".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.get::<Vec<String>>(&key(1)).unwrap().is_fresh());
    }

    #[tokio::test]
    async fn test_invalidate_only_touches_matches() {
        let cache = QueryCache::new();
        cache.set(key(1), &vec!["a".to_string()]).unwrap();
        cache
            .set(QueryKey::new("photos").param("page", 1), &vec!["p".to_string()])
            .unwrap();

        assert_eq!(cache.invalidate(&KeyPredicate::resource("albums")), 1);
        let photos = cache
            .get::<Vec<String>>(&QueryKey::new("photos").param("page", 1))
            .unwrap();
        assert!(photos.is_fresh());
        assert_eq!(cache.stats().stale_entries, 1);
    }

    #[tokio::test]
    async fn test_invalidate_detaches_in_flight_load() {
        let cache = QueryCache::new();
        let calls = counter();

        let k = key(1);
        let slow = cache.fetch(&k, counting_loader(&calls, vec!["before".into()]));
        let invalidate_then_fetch = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cache.invalidate(&KeyPredicate::Exact(key(1)));
            cache
                .fetch(&key(1), counting_loader(&calls, vec!["after".into()]))
                .await
        };

        let (old, new) = tokio::join!(slow, invalidate_then_fetch);
        assert_eq!(old.unwrap(), vec!["before".to_string()]);
        assert_eq!(new.unwrap(), vec!["after".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let entry = cache.get::<Vec<String>>(&key(1)).unwrap();
        assert_eq!(entry.value, Some(vec!["after".to_string()]));
        assert!(entry.is_fresh());
    }

    #[tokio::test]
    async fn test_prefetch_is_picked_up_by_fetch() {
        let cache = QueryCache::new();
        let calls = counter();

        cache.prefetch(key(2), counting_loader(&calls, vec!["p2".into()]));
        assert!(cache.is_fetching(&key(2)));

        let value: Vec<String> = cache
            .fetch(&key(2), counting_loader(&calls, vec!["other".into()]))
            .await
            .unwrap();
        assert_eq!(value, vec!["p2".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_prefetch_errors_are_swallowed() {
        let cache = QueryCache::new();
        cache.prefetch(key(3), || async {
            Err::<Vec<String>, _>(Error::NotFound("gone".into()))
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        let entry = cache.get::<Vec<String>>(&key(3)).unwrap();
        assert_eq!(entry.error, Some(Error::NotFound("gone".into())));
        assert!(!entry.is_fetching);
    }

    #[tokio::test]
    async fn test_prefetch_skips_fresh_entries() {
        let cache = QueryCache::new();
        let calls = counter();
        cache.set(key(1), &vec!["cached".to_string()]).unwrap();

        cache.prefetch(key(1), counting_loader(&calls, vec!["x".into()]));
        assert!(!cache.is_fetching(&key(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_prefetch_without_runtime_is_noop() {
        let cache = QueryCache::new();
        cache.prefetch(key(1), || async { Ok(vec!["x".to_string()]) });
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_strategies() {
        let cache = QueryCache::new();
        let calls = counter();

        let miss: Result<Vec<String>> = cache
            .fetch_with(&key(1), FetchStrategy::Fresh, counting_loader(&calls, vec![]))
            .await;
        assert_eq!(miss.unwrap_err(), Error::CacheMiss);

        let bypass: Vec<String> = cache
            .fetch_with(
                &key(1),
                FetchStrategy::Bypass,
                counting_loader(&calls, vec!["b".into()]),
            )
            .await
            .unwrap();
        assert_eq!(bypass, vec!["b".to_string()]);
        assert!(cache.get::<Vec<String>>(&key(1)).is_none());

        cache.set(key(1), &vec!["cached".to_string()]).unwrap();
        let forced: Vec<String> = cache
            .fetch_with(
                &key(1),
                FetchStrategy::Invalidate,
                counting_loader(&calls, vec!["reloaded".into()]),
            )
            .await
            .unwrap();
        assert_eq!(forced, vec!["reloaded".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.invalidate(&KeyPredicate::All);
        let stale: Vec<String> = cache
            .fetch_with(&key(1), FetchStrategy::Fresh, counting_loader(&calls, vec![]))
            .await
            .unwrap();
        assert_eq!(stale, vec!["reloaded".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_type_mismatch_reloads_entry() {
        let cache = QueryCache::new();
        cache.set(key(1), &42u8).unwrap();

        let value: Vec<String> = cache
            .fetch(&key(1), || async { Ok(vec!["typed".to_string()]) })
            .await
            .unwrap();
        assert_eq!(value, vec!["typed".to_string()]);
    }

    #[tokio::test]
    async fn test_housekeeping() {
        let cache = QueryCache::new();
        cache.set(key(2), &vec!["b".to_string()]).unwrap();
        cache.set(key(1), &vec!["a".to_string()]).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys(), vec![key(1), key(2)]);
        assert!(cache.stats().total_bytes > 0);

        assert!(cache.remove(&key(1)));
        assert!(!cache.remove(&key(1)));
        cache.clear();
        assert!(cache.is_empty());
    }
}
