//! Fetch strategies for the query cache.
//!
//! | Strategy | Fresh entry | Stale / absent entry | Use case |
//! |----------|-------------|----------------------|----------|
//! | **Refresh** | Return it | Call loader, store | Default for every screen |
//! | **Fresh** | Return it | `Error::CacheMiss` | Render only what is cached |
//! | **Invalidate** | Mark stale, call loader | Call loader, store | Refetch one detail after a mutation |
//! | **Bypass** | Ignore | Call loader, do not store | One-off reads |
//!
//! De-duplication applies to `Refresh` and `Invalidate`: a concurrent fetch
//! for the same key joins the request already in flight.

/// Strategy controlling how [`QueryCache::fetch_with`](crate::QueryCache::fetch_with)
/// treats the cached entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    /// Serve a fresh cached value, otherwise load and store.
    #[default]
    Refresh,

    /// Serve from cache only; never calls the loader.
    ///
    /// A stale value still counts: it is the last known result.
    Fresh,

    /// Mark the entry stale, then behave like `Refresh`.
    Invalidate,

    /// Call the loader and leave the cache untouched.
    Bypass,
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Refresh => write!(f, "Refresh"),
            FetchStrategy::Fresh => write!(f, "Fresh"),
            FetchStrategy::Invalidate => write!(f, "Invalidate"),
            FetchStrategy::Bypass => write!(f, "Bypass"),
        }
    }
}
