//! Gallery data-access facade.
//!
//! [`Gallery`] wires one [`QueryCache`] to an API client and exposes what the
//! gallery screens need: list queries for every paginated view, cached
//! detail lookups, and mutations that invalidate the right keys.
//!
//! # Invalidation on success
//!
//! | Mutation        | Invalidated                                     |
//! |-----------------|-------------------------------------------------|
//! | `register`      | `users`                                         |
//! | `create_album`  | `albums`, `user_albums{userId=owner}`, `album`, `albums-counts` |
//! | `update_album`  | `albums`, `user_albums{userId=owner}`, `album`, `albums-counts` |
//! | `delete_album`  | `albums`, `user_albums`, `album`, `albums-counts`, `photos`     |
//! | `create_photo`  | `photos`, `albums`                              |
//! | `update_photo`  | `photos`, `photo`                               |
//! | `delete_photo`  | `photos`, `photo`                               |

use crate::api::{GalleryApi, HttpGallery};
use crate::auth::{FileTokenStore, Session, TokenStore};
use crate::cache::QueryCache;
use crate::config::{GalleryConfig, PageSizes};
use crate::error::{Error, Result};
use crate::key::{kinds, params, KeyPredicate, QueryKey, Scope};
use crate::model::{
    Album, AlbumCount, AlbumCreate, AlbumUpdate, ApiEntity, Credentials, ListResponse, Message,
    Photo, PhotoCreate, PhotoUpdate, Token, User, UserRegister,
};
use crate::mutation::Mutator;
use crate::pagination::{ListQuery, Page, PageCursor, PageState, PageWindow, Paginator};
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Entry point for reading and writing gallery data.
///
/// Cloning is cheap and every clone shares the same cache.
///
/// # Example
///
/// ```ignore
/// let gallery = Gallery::connect(&GalleryConfig::from_env()?)?;
///
/// let albums = gallery.albums();
/// let page = gallery.load(&albums, 1).await;
/// if page.has_next_page { /* show "next" */ }
///
/// gallery.create_album(&AlbumCreate { title: "Trip".into(), ..Default::default() }).await?;
/// ```
#[derive(Clone)]
pub struct Gallery {
    api: Arc<dyn GalleryApi>,
    cache: QueryCache,
    paginator: Paginator,
    mutator: Mutator,
    session: Session,
    page_sizes: PageSizes,
}

impl Gallery {
    pub fn new(api: Arc<dyn GalleryApi>, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_cache(api, tokens, QueryCache::new())
    }

    pub fn with_cache(
        api: Arc<dyn GalleryApi>,
        tokens: Arc<dyn TokenStore>,
        cache: QueryCache,
    ) -> Self {
        Gallery {
            session: Session::new(api.clone(), tokens, cache.clone()),
            paginator: Paginator::new(cache.clone()),
            mutator: Mutator::new(cache.clone()),
            page_sizes: PageSizes::default(),
            api,
            cache,
        }
    }

    pub fn with_page_sizes(mut self, page_sizes: PageSizes) -> Self {
        self.page_sizes = page_sizes;
        self
    }

    /// HTTP client with a file-backed token, as configured.
    ///
    /// # Errors
    ///
    /// `Error::Config` for an invalid configuration.
    pub fn connect(config: &GalleryConfig) -> Result<Self> {
        let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&config.token_path));
        let api = HttpGallery::new(config, tokens.clone())?;
        info!("Gallery client for {}", api.base_url());

        Ok(Self::new(Arc::new(api), tokens).with_page_sizes(config.page_sizes))
    }

    pub fn api(&self) -> &Arc<dyn GalleryApi> {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn mutator(&self) -> &Mutator {
        &self.mutator
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    /// All users.
    pub fn users(&self) -> ListQuery<User> {
        let api = self.api.clone();
        ListQuery::new(kinds::USERS, Scope::new(), self.page_sizes.users, move |w| {
            let api = api.clone();
            async move { api.list_users(w).await }
        })
    }

    /// All albums.
    pub fn albums(&self) -> ListQuery<Album> {
        let api = self.api.clone();
        ListQuery::new(kinds::ALBUMS, Scope::new(), self.page_sizes.albums, move |w| {
            let api = api.clone();
            async move { api.list_albums(w).await }
        })
    }

    /// All photos.
    pub fn photos(&self) -> ListQuery<Photo> {
        let api = self.api.clone();
        ListQuery::new(kinds::PHOTOS, Scope::new(), self.page_sizes.photos, move |w| {
            let api = api.clone();
            async move { api.list_photos(w).await }
        })
    }

    /// Albums owned by `user_id`.
    pub fn user_albums(&self, user_id: &str) -> ListQuery<Album> {
        let api = self.api.clone();
        let owner = user_id.to_string();
        let scope = Scope::new().with(params::USER_ID, user_id);

        ListQuery::new(kinds::USER_ALBUMS, scope, self.page_sizes.albums, move |w| {
            let api = api.clone();
            let owner = owner.clone();
            async move { api.list_user_albums(&owner, w).await }
        })
    }

    /// Photos of one album, eight to a page by default.
    pub fn album_photos(&self, user_id: &str, album_id: &str) -> ListQuery<Photo> {
        let api = self.api.clone();
        let (owner, album) = (user_id.to_string(), album_id.to_string());
        let scope = Scope::new()
            .with(params::USER_ID, user_id)
            .with(params::ALBUM_ID, album_id);

        ListQuery::new(kinds::PHOTOS, scope, self.page_sizes.album_photos, move |w| {
            let api = api.clone();
            let (owner, album) = (owner.clone(), album.clone());
            async move { api.list_album_photos(&owner, &album, w).await }
        })
    }

    /// Load one page of `query`. See [`Paginator::load`].
    pub async fn load<T>(&self, query: &ListQuery<T>, page: impl Into<Page>) -> PageState<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        self.paginator.load(query, page).await
    }

    /// A page cursor over `query`, starting at page 1.
    pub fn cursor<T>(&self, query: ListQuery<T>) -> PageCursor<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        PageCursor::new(self.paginator.clone(), query)
    }

    // ------------------------------------------------------------------
    // Details
    // ------------------------------------------------------------------

    pub async fn user(&self, user_id: &str) -> Result<User> {
        let key = QueryKey::new(kinds::USER).param(params::USER_ID, user_id);
        let (api, id) = (self.api.clone(), user_id.to_string());
        self.cache
            .fetch(&key, move || async move { api.get_user(&id).await })
            .await
    }

    pub async fn album(&self, album_id: &str) -> Result<Album> {
        let key = QueryKey::new(kinds::ALBUM).param(params::ALBUM_ID, album_id);
        let (api, id) = (self.api.clone(), album_id.to_string());
        self.cache
            .fetch(&key, move || async move { api.get_album(&id).await })
            .await
    }

    pub async fn photo(&self, user_id: &str, album_id: &str, photo_id: &str) -> Result<Photo> {
        let key = QueryKey::new(kinds::PHOTO)
            .param(params::USER_ID, user_id)
            .param(params::ALBUM_ID, album_id)
            .param(params::PHOTO_ID, photo_id);
        let api = self.api.clone();
        let ids = (
            user_id.to_string(),
            album_id.to_string(),
            photo_id.to_string(),
        );
        self.cache
            .fetch(&key, move || async move {
                let (user, album, photo) = ids;
                api.get_photo(&user, &album, &photo).await
            })
            .await
    }

    /// The logged-in user, or `None` without asking the server when no token
    /// is stored.
    pub async fn current_user(&self) -> Result<Option<User>> {
        if !self.session.is_logged_in().await {
            return Ok(None);
        }
        let api = self.api.clone();
        self.cache
            .fetch(&QueryKey::new(kinds::CURRENT_USER), move || async move {
                api.current_user().await
            })
            .await
            .map(Some)
    }

    /// How many albums each user owns, in the order given.
    ///
    /// Users are counted concurrently; any failure fails the whole lookup.
    pub async fn album_counts(&self, user_ids: &[String]) -> Result<Vec<AlbumCount>> {
        let key = QueryKey::new(kinds::ALBUM_COUNTS).param(params::IDS, user_ids.join(","));
        let api = self.api.clone();
        let ids = user_ids.to_vec();
        let page_size = self.page_sizes.albums;

        self.cache
            .fetch(&key, move || async move {
                try_join_all(ids.into_iter().map(|user_id| {
                    let api = api.clone();
                    async move {
                        let count = count_pages(page_size, |window| {
                            api.list_user_albums(&user_id, window)
                        })
                        .await?;
                        Ok::<_, Error>(AlbumCount { user_id, count })
                    }
                }))
                .await
            })
            .await
    }

    // ------------------------------------------------------------------
    // Session and mutations
    // ------------------------------------------------------------------

    pub async fn login(&self, credentials: &Credentials) -> Result<Token> {
        self.session.login(credentials).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.logout().await
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.is_logged_in().await
    }

    /// Sign up. The form is checked locally first.
    ///
    /// # Errors
    ///
    /// `Error::Validation` before any request if the form is incomplete.
    pub async fn register(&self, form: &UserRegister, confirm_password: &str) -> Result<User> {
        form.validate(confirm_password)?;
        self.mutator
            .mutate(
                self.api.register(form),
                &[KeyPredicate::resource(kinds::USERS)],
            )
            .await
    }

    /// # Errors
    ///
    /// `Error::Validation` before any request if the title is blank.
    pub async fn create_album(&self, album: &AlbumCreate) -> Result<Album> {
        album.validate()?;
        self.mutator
            .mutate_with(self.api.create_album(album), album_scope)
            .await
    }

    pub async fn update_album(&self, album_id: &str, update: &AlbumUpdate) -> Result<Album> {
        self.mutator
            .mutate_with(self.api.update_album(album_id, update), album_scope)
            .await
    }

    /// Deleting an album deletes its photos too.
    pub async fn delete_album(&self, album_id: &str) -> Result<Message> {
        self.mutator
            .mutate(
                self.api.delete_album(album_id),
                &[
                    KeyPredicate::resource(kinds::ALBUMS),
                    KeyPredicate::resource(kinds::USER_ALBUMS),
                    KeyPredicate::resource(kinds::ALBUM),
                    KeyPredicate::resource(kinds::ALBUM_COUNTS),
                    KeyPredicate::resource(kinds::PHOTOS),
                ],
            )
            .await
    }

    /// # Errors
    ///
    /// `Error::Validation` before any request if a field is blank.
    pub async fn create_photo(&self, album_id: &str, photo: &PhotoCreate) -> Result<Photo> {
        photo.validate()?;
        self.mutator
            .mutate(
                self.api.create_photo(album_id, photo),
                &[
                    KeyPredicate::resource(kinds::PHOTOS),
                    KeyPredicate::resource(kinds::ALBUMS),
                ],
            )
            .await
    }

    pub async fn update_photo(&self, photo_id: &str, update: &PhotoUpdate) -> Result<Photo> {
        self.mutator
            .mutate(self.api.update_photo(photo_id, update), &photo_scope())
            .await
    }

    pub async fn delete_photo(&self, photo_id: &str) -> Result<Message> {
        self.mutator
            .mutate(self.api.delete_photo(photo_id), &photo_scope())
            .await
    }
}

fn album_scope(album: &Album) -> Vec<KeyPredicate> {
    vec![
        KeyPredicate::resource(kinds::ALBUMS),
        KeyPredicate::scoped(
            kinds::USER_ALBUMS,
            Scope::new().with(params::USER_ID, &album.owner_id),
        ),
        KeyPredicate::resource(kinds::ALBUM),
        KeyPredicate::resource(kinds::ALBUM_COUNTS),
    ]
}

fn photo_scope() -> [KeyPredicate; 2] {
    [
        KeyPredicate::resource(kinds::PHOTOS),
        KeyPredicate::resource(kinds::PHOTO),
    ]
}

/// Count a paged collection by walking its windows.
///
/// Stops at a short or empty page, or when a page repeats the previous one
/// (a server that ignores `skip`).
async fn count_pages<T, F, Fut>(page_size: u32, load: F) -> Result<usize>
where
    T: ApiEntity,
    F: Fn(PageWindow) -> Fut,
    Fut: Future<Output = Result<ListResponse<T>>>,
{
    let page_size = page_size.max(1);
    let mut total = 0;
    let mut page = Page::FIRST;
    let mut previous_first: Option<String> = None;
    loop {
        let list = load(PageWindow::new(page, page_size)).await?;
        let first = list.data.first().map(|item| item.id().to_string());
        if first.is_none() || first == previous_first {
            return Ok(total);
        }
        total += list.data.len();

        let next = page.next();
        if list.data.len() < page_size as usize || next == page {
            return Ok(total);
        }
        previous_first = first;
        page = next;
    }
}
