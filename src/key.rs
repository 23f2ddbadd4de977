//! Query keys and invalidation predicates.
//!
//! A [`QueryKey`] names one cached query: a resource kind such as `"albums"`
//! plus scoping parameters such as `userId` or `page`. Parameters live in a
//! sorted map, so two keys built from the same pairs in any order are equal
//! and hash the same.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Well-known resource kinds used by the gallery screens.
pub mod kinds {
    pub const USERS: &str = "users";
    pub const USER: &str = "user";
    pub const CURRENT_USER: &str = "currentUser";
    pub const ALBUMS: &str = "albums";
    pub const ALBUM: &str = "album";
    pub const USER_ALBUMS: &str = "user_albums";
    pub const ALBUM_COUNTS: &str = "albums-counts";
    pub const PHOTOS: &str = "photos";
    pub const PHOTO: &str = "photo";
}

/// Parameter names shared by keys and predicates.
pub mod params {
    pub const PAGE: &str = "page";
    pub const USER_ID: &str = "userId";
    pub const ALBUM_ID: &str = "albumId";
    pub const PHOTO_ID: &str = "photoId";
    pub const IDS: &str = "ids";
}

/// Scoping parameters of a query, e.g. `{userId: "u1"}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(BTreeMap<String, String>);

impl Scope {
    pub fn new() -> Self {
        Scope(BTreeMap::new())
    }

    /// Add or replace a parameter.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(name.into(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when every pair of `other` is present here with the same value.
    pub fn contains(&self, other: &Scope) -> bool {
        other.iter().all(|(k, v)| self.get(k) == Some(v))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Scope::new(), |scope, (k, v)| scope.with(k, v))
    }
}

/// Identifies one cached query.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey {
    resource: String,
    scope: Scope,
}

impl QueryKey {
    pub fn new(resource: impl Into<String>) -> Self {
        QueryKey {
            resource: resource.into(),
            scope: Scope::new(),
        }
    }

    pub fn with_scope(resource: impl Into<String>, scope: Scope) -> Self {
        QueryKey {
            resource: resource.into(),
            scope,
        }
    }

    /// Add a scoping parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.scope = self.scope.with(name, value);
        self
    }

    /// Key of one page of a paginated list.
    pub fn page(resource: impl Into<String>, scope: &Scope, page: u32) -> Self {
        QueryKey::with_scope(resource, scope.clone()).param(crate::key::params::PAGE, page)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl fmt::Display for QueryKey {
    /// Renders `resource` or `resource{k=v,k=v}` with parameters sorted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        if !self.scope.is_empty() {
            write!(f, "{{")?;
            for (i, (k, v)) in self.scope.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", k, v)?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }
}

/// Selects cache entries for invalidation.
#[derive(Clone)]
pub enum KeyPredicate {
    /// Every entry.
    All,
    /// Entries of a resource kind, whatever their parameters.
    Resource(String),
    /// Entries of a resource kind whose scope contains these pairs.
    Scoped { resource: String, scope: Scope },
    /// Exactly one key.
    Exact(QueryKey),
    /// Arbitrary test over the key.
    Custom(Arc<dyn Fn(&QueryKey) -> bool + Send + Sync>),
}

impl KeyPredicate {
    pub fn resource(resource: impl Into<String>) -> Self {
        KeyPredicate::Resource(resource.into())
    }

    pub fn scoped(resource: impl Into<String>, scope: Scope) -> Self {
        KeyPredicate::Scoped {
            resource: resource.into(),
            scope,
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&QueryKey) -> bool + Send + Sync + 'static,
    {
        KeyPredicate::Custom(Arc::new(f))
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyPredicate::All => true,
            KeyPredicate::Resource(resource) => key.resource == *resource,
            KeyPredicate::Scoped { resource, scope } => {
                key.resource == *resource && key.scope.contains(scope)
            }
            KeyPredicate::Exact(exact) => key == exact,
            KeyPredicate::Custom(f) => f(key),
        }
    }
}

impl fmt::Debug for KeyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPredicate::All => write!(f, "All"),
            KeyPredicate::Resource(r) => write!(f, "Resource({})", r),
            KeyPredicate::Scoped { resource, scope } => {
                write!(f, "Scoped({})", QueryKey::with_scope(resource.clone(), scope.clone()))
            }
            KeyPredicate::Exact(key) => write!(f, "Exact({})", key),
            KeyPredicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl From<QueryKey> for KeyPredicate {
    fn from(key: QueryKey) -> Self {
        KeyPredicate::Exact(key)
    }
}
