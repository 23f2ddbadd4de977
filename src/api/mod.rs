//! Contract of the gallery REST API.
//!
//! [`GalleryApi`] is the seam between the data-access layer and the network.
//! [`HttpGallery`] talks to a real server; [`InMemoryGallery`] keeps
//! everything in process for tests and offline demos.
//!
//! Every list call takes a [`PageWindow`] and returns `{data, count}` where
//! `count` is the size of this page only. Failures are reported through
//! [`Error`](crate::Error) so callers can tell transport problems from
//! "not found" and "validation failed".

mod http;
mod memory;

pub use http::HttpGallery;
pub use memory::InMemoryGallery;

use crate::error::Result;
use crate::model::{
    Album, AlbumCreate, AlbumUpdate, Credentials, ListResponse, Message, Photo, PhotoCreate,
    PhotoUpdate, Token, User, UserRegister,
};
use crate::pagination::PageWindow;
use async_trait::async_trait;

/// Operations the gallery server exposes.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    /// `POST /login` with a form-encoded body.
    async fn login(&self, credentials: &Credentials) -> Result<Token>;

    async fn register(&self, user: &UserRegister) -> Result<User>;

    /// The user the stored token belongs to.
    async fn current_user(&self) -> Result<User>;

    async fn list_users(&self, window: PageWindow) -> Result<ListResponse<User>>;

    async fn get_user(&self, user_id: &str) -> Result<User>;

    async fn list_albums(&self, window: PageWindow) -> Result<ListResponse<Album>>;

    /// Albums owned by one user.
    async fn list_user_albums(
        &self,
        user_id: &str,
        window: PageWindow,
    ) -> Result<ListResponse<Album>>;

    async fn get_album(&self, album_id: &str) -> Result<Album>;

    /// Create an album owned by the current user.
    async fn create_album(&self, album: &AlbumCreate) -> Result<Album>;

    async fn update_album(&self, album_id: &str, update: &AlbumUpdate) -> Result<Album>;

    async fn delete_album(&self, album_id: &str) -> Result<Message>;

    async fn list_photos(&self, window: PageWindow) -> Result<ListResponse<Photo>>;

    /// Photos of one album, addressed through its owner.
    async fn list_album_photos(
        &self,
        user_id: &str,
        album_id: &str,
        window: PageWindow,
    ) -> Result<ListResponse<Photo>>;

    async fn get_photo(&self, user_id: &str, album_id: &str, photo_id: &str) -> Result<Photo>;

    async fn create_photo(&self, album_id: &str, photo: &PhotoCreate) -> Result<Photo>;

    async fn update_photo(&self, photo_id: &str, update: &PhotoUpdate) -> Result<Photo>;

    async fn delete_photo(&self, photo_id: &str) -> Result<Message>;
}
