//! In-process implementation of [`GalleryApi`].
//!
//! Behaves like the server closely enough for the controllers above it:
//! page windows, 404 and 422 errors, ownership by the logged-in user. It
//! also counts calls per operation and can inject latency or a one-shot
//! failure, which is what tests use it for.

use super::GalleryApi;
use crate::auth::{MemoryTokenStore, TokenStore};
use crate::error::{Error, Result};
use crate::model::{
    Album, AlbumCreate, AlbumUpdate, ApiEntity, Credentials, ListResponse, Message, Photo,
    PhotoCreate, PhotoUpdate, Token, User, UserRegister,
};
use crate::pagination::PageWindow;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const TOKEN_PREFIX: &str = "token-";

struct Stored<T> {
    seq: u64,
    value: T,
}

/// Server fake backed by `DashMap`s.
///
/// # Example
///
/// ```ignore
/// let api = InMemoryGallery::new();
/// let user = api.seed_user("jane@example.com", "secret123");
/// let album = api.seed_album(&user.id, "Trip");
/// api.seed_photo(&album.id, "Beach")?;
/// ```
pub struct InMemoryGallery {
    users: DashMap<String, Stored<User>>,
    passwords: DashMap<String, String>,
    albums: DashMap<String, Stored<Album>>,
    photos: DashMap<String, Stored<Photo>>,
    user_seq: AtomicU64,
    album_seq: AtomicU64,
    photo_seq: AtomicU64,
    calls: DashMap<&'static str, usize>,
    failures: DashMap<&'static str, Error>,
    latency_ms: AtomicU64,
    tokens: Arc<dyn TokenStore>,
}

impl InMemoryGallery {
    /// A fake with its own token store.
    pub fn new() -> Self {
        Self::with_tokens(Arc::new(MemoryTokenStore::new()))
    }

    /// A fake that reads the caller's token from `tokens`, as the HTTP
    /// client does.
    pub fn with_tokens(tokens: Arc<dyn TokenStore>) -> Self {
        InMemoryGallery {
            users: DashMap::new(),
            passwords: DashMap::new(),
            albums: DashMap::new(),
            photos: DashMap::new(),
            user_seq: AtomicU64::new(0),
            album_seq: AtomicU64::new(0),
            photo_seq: AtomicU64::new(0),
            calls: DashMap::new(),
            failures: DashMap::new(),
            latency_ms: AtomicU64::new(0),
            tokens,
        }
    }

    // ------------------------------------------------------------------
    // Seeding and test controls
    // ------------------------------------------------------------------

    /// Add a user that can log in with `email` and `password`.
    pub fn seed_user(&self, email: &str, password: &str) -> User {
        let seq = self.user_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let local = email.split('@').next().unwrap_or(email);
        let user = User {
            id: format!("u{}", seq),
            email: email.to_string(),
            name: local.to_string(),
            username: local.to_string(),
            is_superuser: false,
            is_active: true,
            avatar: None,
        };
        self.passwords.insert(user.id.clone(), password.to_string());
        store(&self.users, seq, &user);
        user
    }

    pub fn seed_album(&self, owner_id: &str, title: &str) -> Album {
        self.insert_album(
            owner_id,
            &AlbumCreate {
                title: title.to_string(),
                ..Default::default()
            },
        )
    }

    /// # Errors
    ///
    /// `Error::NotFound` if the album does not exist.
    pub fn seed_photo(&self, album_id: &str, title: &str) -> Result<Photo> {
        self.insert_photo(
            album_id,
            &PhotoCreate {
                photo_title: title.to_string(),
                image_url: format!("https://img.example.com/{}.jpg", title.to_lowercase()),
            },
        )
    }

    /// Number of times `operation` (a [`GalleryApi`] method name) was called.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls.get(operation).map(|c| *c).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    pub fn reset_calls(&self) {
        self.calls.clear();
    }

    /// Make the next call to `operation` fail with `error`.
    pub fn fail_next(&self, operation: &'static str, error: Error) {
        self.failures.insert(operation, error);
    }

    /// Delay every call, so concurrent requests overlap.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn enter(&self, operation: &'static str) -> Result<()> {
        *self.calls.entry(operation).or_insert(0) += 1;
        trace!("InMemoryGallery {}", operation);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        match self.failures.remove(operation) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }

    async fn caller(&self) -> Result<User> {
        let token = self
            .tokens
            .load()
            .await?
            .ok_or_else(|| Error::Unauthorized("Not authenticated".to_string()))?;

        token
            .strip_prefix(TOKEN_PREFIX)
            .and_then(|id| self.users.get(id).map(|u| u.value.clone()))
            .ok_or_else(|| Error::Unauthorized("Could not validate credentials".to_string()))
    }

    fn insert_album(&self, owner_id: &str, album: &AlbumCreate) -> Album {
        let seq = self.album_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let now = timestamp();
        let album = Album {
            id: format!("a{}", seq),
            owner_id: owner_id.to_string(),
            title: album.title.clone(),
            description: album.description.clone(),
            cover_photo: album.cover_photo.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        store(&self.albums, seq, &album);
        album
    }

    fn insert_photo(&self, album_id: &str, photo: &PhotoCreate) -> Result<Photo> {
        let owner_id = self
            .albums
            .get(album_id)
            .map(|a| a.value.owner_id.clone())
            .ok_or_else(|| Error::NotFound("Album not found".to_string()))?;

        let seq = self.photo_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let now = timestamp();
        let photo = Photo {
            id: format!("p{}", seq),
            album_id: album_id.to_string(),
            owner_id,
            photo_title: photo.photo_title.clone(),
            image_url: photo.image_url.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        store(&self.photos, seq, &photo);
        Ok(photo)
    }

    fn owned_album(&self, album_id: &str, caller: &User) -> Result<Album> {
        let album = self
            .albums
            .get(album_id)
            .map(|a| a.value.clone())
            .ok_or_else(|| Error::NotFound("Album not found".to_string()))?;
        if album.owner_id != caller.id && !caller.is_superuser {
            return Err(Error::Api {
                status: 400,
                message: "Not enough permissions".to_string(),
            });
        }
        Ok(album)
    }

    fn owned_photo(&self, photo_id: &str, caller: &User) -> Result<Photo> {
        let photo = self
            .photos
            .get(photo_id)
            .map(|p| p.value.clone())
            .ok_or_else(|| Error::NotFound("Photo not found".to_string()))?;
        if photo.owner_id != caller.id && !caller.is_superuser {
            return Err(Error::Api {
                status: 400,
                message: "Not enough permissions".to_string(),
            });
        }
        Ok(photo)
    }
}

impl Default for InMemoryGallery {
    fn default() -> Self {
        Self::new()
    }
}

fn timestamp() -> String {
    chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn store<T: ApiEntity>(map: &DashMap<String, Stored<T>>, seq: u64, value: &T) {
    map.insert(
        value.id().to_string(),
        Stored {
            seq,
            value: value.clone(),
        },
    );
}

/// Sort by insertion order and cut out `window`.
fn window_of<T: Clone>(
    map: &DashMap<String, Stored<T>>,
    keep: impl Fn(&T) -> bool,
    window: PageWindow,
) -> ListResponse<T> {
    let mut rows: Vec<(u64, T)> = map
        .iter()
        .filter(|row| keep(&row.value))
        .map(|row| (row.seq, row.value.clone()))
        .collect();
    rows.sort_by_key(|(seq, _)| *seq);

    let data: Vec<T> = rows
        .into_iter()
        .skip(window.skip as usize)
        .take(window.limit as usize)
        .map(|(_, value)| value)
        .collect();
    ListResponse {
        count: data.len(),
        data,
    }
}

#[async_trait]
impl GalleryApi for InMemoryGallery {
    async fn login(&self, credentials: &Credentials) -> Result<Token> {
        self.enter("login").await?;

        let user_id = self
            .users
            .iter()
            .find(|u| {
                u.value.email == credentials.username || u.value.username == credentials.username
            })
            .map(|u| u.key().clone());

        match user_id {
            Some(id)
                if self
                    .passwords
                    .get(&id)
                    .is_some_and(|p| *p == credentials.password) =>
            {
                Ok(Token {
                    access_token: format!("{}{}", TOKEN_PREFIX, id),
                    token_type: "bearer".to_string(),
                })
            }
            _ => Err(Error::Api {
                status: 400,
                message: "Incorrect email or password".to_string(),
            }),
        }
    }

    async fn register(&self, user: &UserRegister) -> Result<User> {
        self.enter("register").await?;

        if self.users.iter().any(|u| u.value.email == user.email) {
            return Err(Error::Api {
                status: 400,
                message: "The user with this email already exists in the system".to_string(),
            });
        }

        let mut created = self.seed_user(&user.email, &user.password);
        created.name = user.name.clone().unwrap_or_default();
        if let Some(username) = &user.username {
            created.username = username.clone();
        }
        created.avatar = user.avatar.clone();
        if let Some(mut stored) = self.users.get_mut(&created.id) {
            stored.value = created.clone();
        }
        Ok(created)
    }

    async fn current_user(&self) -> Result<User> {
        self.enter("current_user").await?;
        self.caller().await
    }

    async fn list_users(&self, window: PageWindow) -> Result<ListResponse<User>> {
        self.enter("list_users").await?;
        Ok(window_of(&self.users, |_| true, window))
    }

    async fn get_user(&self, user_id: &str) -> Result<User> {
        self.enter("get_user").await?;
        self.users
            .get(user_id)
            .map(|u| u.value.clone())
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    async fn list_albums(&self, window: PageWindow) -> Result<ListResponse<Album>> {
        self.enter("list_albums").await?;
        Ok(window_of(&self.albums, |_| true, window))
    }

    async fn list_user_albums(
        &self,
        user_id: &str,
        window: PageWindow,
    ) -> Result<ListResponse<Album>> {
        self.enter("list_user_albums").await?;
        if !self.users.contains_key(user_id) {
            return Err(Error::NotFound("User not found".to_string()));
        }
        Ok(window_of(&self.albums, |a| a.owner_id == user_id, window))
    }

    async fn get_album(&self, album_id: &str) -> Result<Album> {
        self.enter("get_album").await?;
        self.albums
            .get(album_id)
            .map(|a| a.value.clone())
            .ok_or_else(|| Error::NotFound("Album not found".to_string()))
    }

    async fn create_album(&self, album: &AlbumCreate) -> Result<Album> {
        self.enter("create_album").await?;
        let caller = self.caller().await?;
        album.validate()?;
        Ok(self.insert_album(&caller.id, album))
    }

    async fn update_album(&self, album_id: &str, update: &AlbumUpdate) -> Result<Album> {
        self.enter("update_album").await?;
        let caller = self.caller().await?;
        let mut album = self.owned_album(album_id, &caller)?;

        if let Some(title) = &update.title {
            album.title = title.clone();
        }
        if let Some(description) = &update.description {
            album.description = Some(description.clone());
        }
        if let Some(cover) = &update.cover_photo {
            album.cover_photo = Some(cover.clone());
        }
        album.updated_at = timestamp();

        if let Some(mut stored) = self.albums.get_mut(album_id) {
            stored.value = album.clone();
        }
        Ok(album)
    }

    async fn delete_album(&self, album_id: &str) -> Result<Message> {
        self.enter("delete_album").await?;
        let caller = self.caller().await?;
        self.owned_album(album_id, &caller)?;

        self.albums.remove(album_id);
        self.photos.retain(|_, p| p.value.album_id != album_id);
        Ok(Message {
            message: "Album deleted successfully".to_string(),
        })
    }

    async fn list_photos(&self, window: PageWindow) -> Result<ListResponse<Photo>> {
        self.enter("list_photos").await?;
        Ok(window_of(&self.photos, |_| true, window))
    }

    async fn list_album_photos(
        &self,
        user_id: &str,
        album_id: &str,
        window: PageWindow,
    ) -> Result<ListResponse<Photo>> {
        self.enter("list_album_photos").await?;
        let owned = self
            .albums
            .get(album_id)
            .is_some_and(|a| a.value.owner_id == user_id);
        if !owned {
            return Err(Error::NotFound("Album not found".to_string()));
        }
        Ok(window_of(&self.photos, |p| p.album_id == album_id, window))
    }

    async fn get_photo(&self, user_id: &str, album_id: &str, photo_id: &str) -> Result<Photo> {
        self.enter("get_photo").await?;
        self.photos
            .get(photo_id)
            .map(|p| p.value.clone())
            .filter(|p| p.album_id == album_id && p.owner_id == user_id)
            .ok_or_else(|| Error::NotFound("Photo not found".to_string()))
    }

    async fn create_photo(&self, album_id: &str, photo: &PhotoCreate) -> Result<Photo> {
        self.enter("create_photo").await?;
        let caller = self.caller().await?;
        self.owned_album(album_id, &caller)?;
        photo.validate()?;
        self.insert_photo(album_id, photo)
    }

    async fn update_photo(&self, photo_id: &str, update: &PhotoUpdate) -> Result<Photo> {
        self.enter("update_photo").await?;
        let caller = self.caller().await?;
        let mut photo = self.owned_photo(photo_id, &caller)?;

        if let Some(title) = &update.photo_title {
            photo.photo_title = title.clone();
        }
        if let Some(url) = &update.image_url {
            photo.image_url = url.clone();
        }
        photo.updated_at = timestamp();

        if let Some(mut stored) = self.photos.get_mut(photo_id) {
            stored.value = photo.clone();
        }
        Ok(photo)
    }

    async fn delete_photo(&self, photo_id: &str) -> Result<Message> {
        self.enter("delete_photo").await?;
        let caller = self.caller().await?;
        self.owned_photo(photo_id, &caller)?;

        self.photos.remove(photo_id);
        Ok(Message {
            message: "Photo deleted successfully".to_string(),
        })
    }
}
