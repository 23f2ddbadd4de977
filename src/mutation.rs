//! Write operations followed by cache invalidation.
//!
//! A mutation is any future that talks to the API and reports success or
//! failure. [`Mutator::mutate`] awaits it and, only once the server has
//! confirmed success, marks the given key sets stale so live lists refetch.
//! There is no optimistic update: a failed mutation leaves the cache as it
//! was.

use crate::cache::QueryCache;
use crate::error::Result;
use crate::key::KeyPredicate;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Runs mutations against a shared [`QueryCache`].
#[derive(Clone)]
pub struct Mutator {
    cache: QueryCache,
    pending: Arc<AtomicUsize>,
}

// Decrements the pending count even if the mutation future is dropped.
struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Mutator {
    pub fn new(cache: QueryCache) -> Self {
        Mutator {
            cache,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Await `operation`; on success invalidate every key matched by
    /// `invalidates`.
    ///
    /// Mutations on unrelated resources run concurrently; nothing here
    /// serializes them.
    ///
    /// # Errors
    ///
    /// Returns the operation's error unchanged. Nothing is invalidated.
    pub async fn mutate<R, Fut>(&self, operation: Fut, invalidates: &[KeyPredicate]) -> Result<R>
    where
        Fut: Future<Output = Result<R>>,
    {
        let result = self.run(operation).await?;
        self.invalidate_all(invalidates);
        Ok(result)
    }

    /// Like [`mutate`](Self::mutate), with the keys to invalidate derived
    /// from the server's response (e.g. the owner of a created album).
    ///
    /// # Errors
    ///
    /// Returns the operation's error unchanged. Nothing is invalidated.
    pub async fn mutate_with<R, Fut, P>(&self, operation: Fut, invalidates: P) -> Result<R>
    where
        Fut: Future<Output = Result<R>>,
        P: FnOnce(&R) -> Vec<KeyPredicate>,
    {
        let result = self.run(operation).await?;
        self.invalidate_all(&invalidates(&result));
        Ok(result)
    }

    async fn run<R, Fut>(&self, operation: Fut) -> Result<R>
    where
        Fut: Future<Output = Result<R>>,
    {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let _guard = PendingGuard(&self.pending);

        operation.await.map_err(|e| {
            warn!("Mutation failed: {}", e);
            e
        })
    }

    fn invalidate_all(&self, predicates: &[KeyPredicate]) {
        let matched: usize = predicates.iter().map(|p| self.cache.invalidate(p)).sum();
        info!(
            "Mutation succeeded; invalidated {} entries across {} predicates",
            matched,
            predicates.len()
        );
    }

    /// Number of mutations currently awaiting the server.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_pending(&self) -> bool {
        self.pending() > 0
    }
}
