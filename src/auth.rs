//! Access-token persistence and the login session.
//!
//! The only persisted client state is the bearer token, stored under
//! [`TOKEN_KEY`]. Whether a token is stored is the sole "logged in" signal;
//! it is never validated locally.

use crate::api::GalleryApi;
use crate::cache::QueryCache;
use crate::error::Result;
use crate::key::{kinds, KeyPredicate};
use crate::model::{Credentials, Token};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Key the access token is stored under.
pub const TOKEN_KEY: &str = "access_token";

/// Durable home of the access token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The stored token, if any.
    ///
    /// # Errors
    /// Returns `Err` if the store exists but cannot be read.
    async fn load(&self) -> Result<Option<String>>;

    /// Replace the stored token.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot be written.
    async fn save(&self, token: &str) -> Result<()>;

    /// Forget the stored token. Clearing an empty store is not an error.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot be written.
    async fn clear(&self) -> Result<()>;
}

/// Token kept in process memory only.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        MemoryTokenStore {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn save(&self, token: &str) -> Result<()> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.token.write().await = None;
        Ok(())
    }
}

/// Token kept in a small JSON key-value file.
///
/// Other keys in the file are preserved; the file is removed once it holds
/// nothing.
#[derive(Clone, Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTokenStore { path: path.into() }
    }

    /// `<local data dir>/gallery-kit/session.json`.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("gallery-kit/session.json");
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if map.is_empty() {
            return match tokio::fs::remove_file(&self.path).await {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(map)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        let mut map = self.read_map().await?;
        Ok(map.remove(TOKEN_KEY).filter(|t| !t.is_empty()))
    }

    async fn save(&self, token: &str) -> Result<()> {
        let mut map = self.read_map().await?;
        map.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_map(&map).await?;
        debug!("Stored access token in {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut map = self.read_map().await?;
        if map.remove(TOKEN_KEY).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

/// Login state on top of a [`TokenStore`].
#[derive(Clone)]
pub struct Session {
    api: Arc<dyn GalleryApi>,
    tokens: Arc<dyn TokenStore>,
    cache: QueryCache,
}

impl Session {
    pub fn new(api: Arc<dyn GalleryApi>, tokens: Arc<dyn TokenStore>, cache: QueryCache) -> Self {
        Session { api, tokens, cache }
    }

    /// Exchange credentials for a token and store it.
    ///
    /// # Errors
    ///
    /// `Error::Validation` for blank fields (no request is sent); otherwise
    /// the API or store error.
    pub async fn login(&self, credentials: &Credentials) -> Result<Token> {
        credentials.validate()?;

        let token = self.api.login(credentials).await?;
        self.tokens.save(&token.access_token).await?;
        self.cache
            .invalidate(&KeyPredicate::resource(kinds::CURRENT_USER));

        info!("Logged in as {}", credentials.username);
        Ok(token)
    }

    /// Drop the stored token.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot be written.
    pub async fn logout(&self) -> Result<()> {
        self.tokens.clear().await?;
        self.cache
            .invalidate(&KeyPredicate::resource(kinds::CURRENT_USER));
        info!("Logged out");
        Ok(())
    }

    /// A token is stored. Read failures count as logged out.
    pub async fn is_logged_in(&self) -> bool {
        match self.tokens.load().await {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!("Could not read access token: {}", e);
                false
            }
        }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }
}
