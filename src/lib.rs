//! # gallery-kit
//!
//! Data-access layer for a photo-album gallery: a keyed query cache with
//! request de-duplication, paginated list loading with next-page prefetch,
//! and mutations that invalidate what they change.
//!
//! ## Layers
//!
//! - [`QueryCache`]: one entry per [`QueryKey`], at most one loader in flight
//!   per key, staleness driven only by invalidation.
//! - [`Paginator`]: "resource X, page N" for every list screen.
//! - [`Mutator`]: create/update/delete followed by cache invalidation.
//! - [`GalleryApi`]: the REST contract, with [`HttpGallery`] over `reqwest`
//!   and [`InMemoryGallery`] for tests.
//! - [`Gallery`]: all of the above wired together.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gallery_kit::{Gallery, GalleryConfig, Credentials};
//!
//! let gallery = Gallery::connect(&GalleryConfig::from_env()?)?;
//! gallery.login(&Credentials::new("jane@example.com", "secret123")).await?;
//!
//! let albums = gallery.albums();
//! let page = gallery.load(&albums, 1).await;
//! for album in &page.items {
//!     println!("{}", album.title);
//! }
//! ```

#[macro_use]
extern crate log;

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod gallery;
pub mod key;
pub mod model;
pub mod mutation;
pub mod observability;
pub mod pagination;
pub mod serialization;
pub mod strategy;
pub mod validate;

// Re-exports for convenience
pub use api::{GalleryApi, HttpGallery, InMemoryGallery};
pub use auth::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use cache::{CacheEntry, CacheStats, QueryCache};
pub use config::{GalleryConfig, PageSizes};
pub use error::{Error, Result};
pub use gallery::Gallery;
pub use key::{KeyPredicate, QueryKey, Scope};
pub use model::{
    Album, AlbumCount, AlbumCreate, AlbumUpdate, ApiEntity, Credentials, ListResponse, Message,
    Photo, PhotoCreate, PhotoUpdate, Token, User, UserRegister,
};
pub use mutation::Mutator;
pub use pagination::{ListQuery, Page, PageCursor, PageData, PageState, PageWindow, Paginator};
pub use strategy::FetchStrategy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
