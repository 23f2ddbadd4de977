//! Client configuration.
//!
//! Values come from defaults, then from the environment (a `.env` file in
//! the working directory is loaded first if present):
//!
//! | Variable               | Field        | Default                   |
//! |------------------------|--------------|---------------------------|
//! | `GALLERY_API_URL`      | `base_url`   | `http://localhost:8000`   |
//! | `GALLERY_TIMEOUT_SECS` | `timeout`    | 30 seconds                |
//! | `GALLERY_TOKEN_PATH`   | `token_path` | local data dir            |

use crate::auth::FileTokenStore;
use crate::error::{Error, Result};
use crate::pagination::{ALBUM_PHOTOS_PAGE_SIZE, DEFAULT_PAGE_SIZE};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const ENV_API_URL: &str = "GALLERY_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "GALLERY_TIMEOUT_SECS";
pub const ENV_TOKEN_PATH: &str = "GALLERY_TOKEN_PATH";

/// Per-list page sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSizes {
    pub users: u32,
    pub albums: u32,
    pub photos: u32,
    pub album_photos: u32,
}

impl Default for PageSizes {
    fn default() -> Self {
        PageSizes {
            users: DEFAULT_PAGE_SIZE,
            albums: DEFAULT_PAGE_SIZE,
            photos: DEFAULT_PAGE_SIZE,
            album_photos: ALBUM_PHOTOS_PAGE_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryConfig {
    /// Server root; endpoint paths are joined onto it.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    pub page_sizes: PageSizes,
    /// Where [`FileTokenStore`] keeps the access token.
    pub token_path: PathBuf,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        GalleryConfig {
            base_url: "http://localhost:8000".to_string(),
            timeout: Duration::from_secs(30),
            page_sizes: PageSizes::default(),
            token_path: FileTokenStore::default_path(),
        }
    }
}

impl GalleryConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_page_sizes(mut self, page_sizes: PageSizes) -> Self {
        self.page_sizes = page_sizes;
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Defaults overridden by the process environment and `.env`.
    ///
    /// # Errors
    ///
    /// `Error::Config` when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// # Errors
    ///
    /// `Error::Config` when a value is unusable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = GalleryConfig::default();

        if let Some(url) = lookup(ENV_API_URL) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be whole seconds, got {:?}", ENV_TIMEOUT_SECS, raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup(ENV_TOKEN_PATH) {
            config.token_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `Error::Config` for a non-HTTP(S) base URL, a zero timeout or a zero
    /// page size.
    pub fn validate(&self) -> Result<()> {
        let url = self.url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base URL must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".to_string()));
        }

        let sizes = self.page_sizes;
        if [sizes.users, sizes.albums, sizes.photos, sizes.album_photos].contains(&0) {
            return Err(Error::Config("page sizes must be positive".to_string()));
        }
        Ok(())
    }

    /// The base URL with a trailing slash, ready for `Url::join`.
    ///
    /// # Errors
    ///
    /// `Error::Config` when `base_url` does not parse.
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}
