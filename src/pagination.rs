//! Paginated list loading with next-page prefetch.
//!
//! Every list screen (users, albums, photos, a user's albums, an album's
//! photos) follows one policy:
//!
//! 1. Page `n` (1-based) maps to `skip = (n - 1) * page_size, limit = page_size`.
//! 2. The page is fetched through the [`QueryCache`] under
//!    `resource{scope.., page=n}`.
//! 3. The API reports only how many items this page holds, so a full page
//!    means "there may be more" and a short page means "this is the last".
//! 4. When a next page may exist it is prefetched in the background.
//!
//! [`ListQuery`] describes one list, [`Paginator`] applies the policy, and
//! [`PageCursor`] tracks the page a screen is showing.

use crate::cache::QueryCache;
use crate::error::{Error, Result};
use crate::key::{QueryKey, Scope};
use crate::model::ListResponse;
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Page size of the users, albums and photos lists.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Page size of the photo grid inside one album.
pub const ALBUM_PHOTOS_PAGE_SIZE: u32 = 8;

/// A 1-based page number. Values below 1 clamp to 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Page(u32);

impl Page {
    pub const FIRST: Page = Page(1);

    /// Clamp any requested page number into range.
    pub fn new(page: i64) -> Self {
        Page(page.clamp(1, i64::from(u32::MAX)) as u32)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Page {
        Page(self.0.saturating_add(1))
    }

    /// The previous page, or page 1.
    pub fn previous(self) -> Page {
        Page(self.0.saturating_sub(1).max(1))
    }

    pub fn is_first(self) -> bool {
        self.0 == 1
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::FIRST
    }
}

impl From<u32> for Page {
    fn from(page: u32) -> Self {
        Page(page.max(1))
    }
}

impl From<i32> for Page {
    fn from(page: i32) -> Self {
        Page::new(i64::from(page))
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `skip`/`limit` pair sent to a list endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u32,
    pub limit: u32,
}

impl PageWindow {
    pub fn new(page: Page, page_size: u32) -> Self {
        PageWindow {
            skip: (page.get() - 1).saturating_mul(page_size),
            limit: page_size,
        }
    }
}

/// Items of one fetched page, as cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData<T> {
    pub items: Vec<T>,
    /// Items in this page as reported by the server.
    pub count: usize,
}

impl<T> From<ListResponse<T>> for PageData<T> {
    fn from(list: ListResponse<T>) -> Self {
        PageData {
            items: list.data,
            count: list.count,
        }
    }
}

/// What a list screen renders for one page.
#[derive(Clone, Debug, PartialEq)]
pub struct PageState<T> {
    pub page: Page,
    pub items: Vec<T>,
    pub is_loading: bool,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub error: Option<Error>,
}

impl<T> PageState<T> {
    fn loaded(page: Page, page_size: u32, items: Vec<T>) -> Self {
        PageState {
            page,
            has_next_page: items.len() == page_size as usize,
            has_previous_page: !page.is_first(),
            is_loading: false,
            items,
            error: None,
        }
    }

    fn failed(page: Page, error: Error) -> Self {
        PageState {
            page,
            items: Vec::new(),
            is_loading: false,
            has_next_page: false,
            has_previous_page: !page.is_first(),
            error: Some(error),
        }
    }

    fn loading(page: Page) -> Self {
        PageState {
            page,
            items: Vec::new(),
            is_loading: true,
            has_next_page: false,
            has_previous_page: !page.is_first(),
            error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

type PageLoader<T> = dyn Fn(PageWindow) -> BoxFuture<'static, Result<PageData<T>>> + Send + Sync;

/// One paginated list: resource kind, scope, page size and loader.
pub struct ListQuery<T> {
    resource: String,
    scope: Scope,
    page_size: u32,
    loader: Arc<PageLoader<T>>,
}

impl<T> Clone for ListQuery<T> {
    fn clone(&self) -> Self {
        ListQuery {
            resource: self.resource.clone(),
            scope: self.scope.clone(),
            page_size: self.page_size,
            loader: self.loader.clone(),
        }
    }
}

impl<T: Send + 'static> ListQuery<T> {
    /// Build a list from an endpoint call taking a page window.
    pub fn new<F, Fut>(resource: impl Into<String>, scope: Scope, page_size: u32, loader: F) -> Self
    where
        F: Fn(PageWindow) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ListResponse<T>>> + Send + 'static,
    {
        ListQuery {
            resource: resource.into(),
            scope,
            page_size: page_size.max(1),
            loader: Arc::new(move |window| loader(window).map(|r| r.map(PageData::from)).boxed()),
        }
    }
}

impl<T> ListQuery<T> {
    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Cache key of `page`.
    pub fn key(&self, page: Page) -> QueryKey {
        QueryKey::page(self.resource.clone(), &self.scope, page.get())
    }

    pub fn window(&self, page: Page) -> PageWindow {
        PageWindow::new(page, self.page_size)
    }

    fn load_fn(&self, page: Page) -> impl FnOnce() -> BoxFuture<'static, Result<PageData<T>>> {
        let loader = self.loader.clone();
        let window = self.window(page);
        move || loader(window)
    }
}

/// Applies the pagination policy over a shared [`QueryCache`].
#[derive(Clone)]
pub struct Paginator {
    cache: QueryCache,
}

impl Paginator {
    pub fn new(cache: QueryCache) -> Self {
        Paginator { cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Fetch one page of `query`.
    ///
    /// Never fails: a load error is reported in [`PageState::error`] with no
    /// items. When the page is full, the next page is prefetched in the
    /// background; this call does not wait for it.
    pub async fn load<T>(&self, query: &ListQuery<T>, page: impl Into<Page>) -> PageState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let page = page.into();
        let key = query.key(page);

        match self.cache.fetch(&key, query.load_fn(page)).await {
            Ok(data) => {
                let state = PageState::loaded(page, query.page_size, data.items);
                if state.has_next_page {
                    self.prefetch(query, page.next());
                }
                state
            }
            Err(e) => {
                debug!("Page {} of {} failed: {}", page, query.resource, e);
                PageState::failed(page, e)
            }
        }
    }

    /// Warm the cache for `page` without waiting.
    pub fn prefetch<T>(&self, query: &ListQuery<T>, page: Page)
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.cache.prefetch(query.key(page), query.load_fn(page));
    }

    /// Render `page` from what is cached right now, without loading.
    pub fn snapshot<T>(&self, query: &ListQuery<T>, page: impl Into<Page>) -> PageState<T>
    where
        T: DeserializeOwned,
    {
        let page = page.into();
        match self.cache.get::<PageData<T>>(&query.key(page)) {
            Some(entry) => match (entry.value, entry.error) {
                (_, Some(e)) if !entry.is_fetching => PageState::failed(page, e),
                (Some(data), _) => {
                    let mut state = PageState::loaded(page, query.page_size, data.items);
                    state.is_loading = entry.is_fetching;
                    state
                }
                _ => PageState::loading(page),
            },
            None => PageState::loading(page),
        }
    }
}

/// The page a list screen is on.
///
/// `load` reports `None` when the page changed while the request was in
/// flight, so a slow earlier page never replaces the page now requested.
pub struct PageCursor<T> {
    paginator: Paginator,
    query: ListQuery<T>,
    page: AtomicU32,
}

impl<T> PageCursor<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new(paginator: Paginator, query: ListQuery<T>) -> Self {
        PageCursor {
            paginator,
            query,
            page: AtomicU32::new(1),
        }
    }

    pub fn query(&self) -> &ListQuery<T> {
        &self.query
    }

    pub fn page(&self) -> Page {
        Page::from(self.page.load(Ordering::SeqCst))
    }

    /// Navigate to `page`, clamped to at least 1. There is no upper bound:
    /// past the end the list is simply empty.
    pub fn set_page(&self, page: i64) -> Page {
        let page = Page::new(page);
        self.page.store(page.get(), Ordering::SeqCst);
        page
    }

    pub fn next_page(&self) -> Page {
        self.set_page(i64::from(self.page().next().get()))
    }

    pub fn previous_page(&self) -> Page {
        self.set_page(i64::from(self.page().previous().get()))
    }

    /// Load the current page. `None` if the cursor moved meanwhile.
    pub async fn load(&self) -> Option<PageState<T>> {
        let requested = self.page();
        let state = self.paginator.load(&self.query, requested).await;
        (self.page() == requested).then_some(state)
    }

    /// Current page from cache, without loading.
    pub fn snapshot(&self) -> PageState<T> {
        self.paginator.snapshot(&self.query, self.page())
    }
}
