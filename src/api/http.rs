//! `reqwest` implementation of [`GalleryApi`].

use super::GalleryApi;
use crate::auth::TokenStore;
use crate::config::GalleryConfig;
use crate::error::{Error, Result};
use crate::model::{
    Album, AlbumCreate, AlbumUpdate, Credentials, ListResponse, Message, Photo, PhotoCreate,
    PhotoUpdate, Token, User, UserRegister,
};
use crate::pagination::PageWindow;
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Gallery client over HTTP.
///
/// The bearer token is read from the [`TokenStore`] on every request, so a
/// login or logout takes effect without rebuilding the client.
#[derive(Clone)]
pub struct HttpGallery {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl HttpGallery {
    /// # Errors
    ///
    /// `Error::Config` for an invalid configuration or if the HTTP client
    /// cannot be built.
    pub fn new(config: &GalleryConfig, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;

        Ok(HttpGallery {
            http,
            base_url: config.url()?,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn paged(&self, path: &str, window: PageWindow) -> Result<Url> {
        let mut url = self.url(path)?;
        url.query_pairs_mut()
            .append_pair("skip", &window.skip.to_string())
            .append_pair("limit", &window.limit.to_string());
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match self.tokens.load().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            debug!("Request failed with {}: {}", status, body);
            return Err(Error::from_status(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        trace!("GET {}", url);
        self.send(self.http.get(url)).await
    }
}

#[async_trait]
impl GalleryApi for HttpGallery {
    async fn login(&self, credentials: &Credentials) -> Result<Token> {
        let url = self.url("login")?;
        self.send(self.http.post(url).form(credentials)).await
    }

    async fn register(&self, user: &UserRegister) -> Result<User> {
        let url = self.url("users/signup")?;
        self.send(self.http.post(url).json(user)).await
    }

    async fn current_user(&self) -> Result<User> {
        self.get(self.url("users/me")?).await
    }

    async fn list_users(&self, window: PageWindow) -> Result<ListResponse<User>> {
        self.get(self.paged("users/", window)?).await
    }

    async fn get_user(&self, user_id: &str) -> Result<User> {
        self.get(self.url(&format!("users/{}", user_id))?).await
    }

    async fn list_albums(&self, window: PageWindow) -> Result<ListResponse<Album>> {
        self.get(self.paged("albums/", window)?).await
    }

    async fn list_user_albums(
        &self,
        user_id: &str,
        window: PageWindow,
    ) -> Result<ListResponse<Album>> {
        self.get(self.paged(&format!("users/{}/albums", user_id), window)?)
            .await
    }

    async fn get_album(&self, album_id: &str) -> Result<Album> {
        self.get(self.url(&format!("albums/{}", album_id))?).await
    }

    async fn create_album(&self, album: &AlbumCreate) -> Result<Album> {
        let url = self.url("albums/")?;
        self.send(self.http.post(url).json(album)).await
    }

    async fn update_album(&self, album_id: &str, update: &AlbumUpdate) -> Result<Album> {
        let url = self.url(&format!("albums/{}", album_id))?;
        self.send(self.http.patch(url).json(update)).await
    }

    async fn delete_album(&self, album_id: &str) -> Result<Message> {
        let url = self.url(&format!("albums/{}", album_id))?;
        self.send(self.http.delete(url)).await
    }

    async fn list_photos(&self, window: PageWindow) -> Result<ListResponse<Photo>> {
        self.get(self.paged("photos/", window)?).await
    }

    async fn list_album_photos(
        &self,
        user_id: &str,
        album_id: &str,
        window: PageWindow,
    ) -> Result<ListResponse<Photo>> {
        let path = format!("users/{}/albums/{}/photos", user_id, album_id);
        self.get(self.paged(&path, window)?).await
    }

    async fn get_photo(&self, user_id: &str, album_id: &str, photo_id: &str) -> Result<Photo> {
        let path = format!("users/{}/albums/{}/photos/{}", user_id, album_id, photo_id);
        self.get(self.url(&path)?).await
    }

    async fn create_photo(&self, album_id: &str, photo: &PhotoCreate) -> Result<Photo> {
        let url = self.url(&format!("albums/{}/photos", album_id))?;
        self.send(self.http.post(url).json(photo)).await
    }

    async fn update_photo(&self, photo_id: &str, update: &PhotoUpdate) -> Result<Photo> {
        let url = self.url(&format!("photos/{}", photo_id))?;
        self.send(self.http.patch(url).json(update)).await
    }

    async fn delete_photo(&self, photo_id: &str) -> Result<Message> {
        let url = self.url(&format!("photos/{}", photo_id))?;
        self.send(self.http.delete(url)).await
    }
}
