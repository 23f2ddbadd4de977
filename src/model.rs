//! Entities and payloads exchanged with the gallery API.
//!
//! Response entities (`User`, `Album`, `Photo`) are also what the query cache
//! stores, so they keep a plain field layout. Request payloads are only ever
//! sent as JSON and may skip unset fields.

use crate::error::{Error, Result};
use crate::validate;
use serde::{Deserialize, Serialize};

/// Trait for entities that carry a server-assigned id.
pub trait ApiEntity: Clone + Send + Sync + Serialize + for<'de> Deserialize<'de> + 'static {
    fn id(&self) -> &str;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    /// Name shown in breadcrumbs and cards.
    pub fn display_name(&self) -> &str {
        [&self.username, &self.name, &self.email]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("user")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_photo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub album_id: String,
    pub owner_id: String,
    #[serde(default)]
    pub photo_title: String,
    #[serde(default)]
    pub image_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ApiEntity for User {
    fn id(&self) -> &str {
        &self.id
    }
}

impl ApiEntity for Album {
    fn id(&self) -> &str {
        &self.id
    }
}

impl ApiEntity for Photo {
    fn id(&self) -> &str {
        &self.id
    }
}

/// List envelope returned by every collection endpoint.
///
/// `count` is the number of items in this response, not a collection total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub count: usize,
}

/// Confirmation body of delete endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Bearer token returned by the login endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

/// Number of albums owned by one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumCount {
    pub user_id: String,
    pub count: usize,
}

/// Form-encoded login body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// # Errors
    ///
    /// `Error::Validation` when either field is blank.
    pub fn validate(&self) -> Result<()> {
        collect(vec![
            validate::required("username", &self.username, "Username is required"),
            validate::required("password", &self.password, "Password is required"),
        ])
    }
}

/// Sign-up payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserRegister {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserRegister {
    /// Check the sign-up form, including the repeated password.
    ///
    /// # Errors
    ///
    /// `Error::Validation` listing every failing field.
    pub fn validate(&self, confirm_password: &str) -> Result<()> {
        let name = self.name.as_deref().unwrap_or_default();
        let username = self.username.as_deref().unwrap_or_default();
        collect(vec![
            validate::required("name", name, "Please enter your full name"),
            validate::required("username", username, "Please enter your username"),
            validate::email("email", &self.email),
            validate::password("password", &self.password),
            validate::password_confirmation("confirm_password", &self.password, confirm_password),
        ])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AlbumCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_photo: Option<String>,
}

impl AlbumCreate {
    /// # Errors
    ///
    /// `Error::Validation` when the title is blank.
    pub fn validate(&self) -> Result<()> {
        collect(vec![validate::required(
            "title",
            &self.title,
            "Please include the album title",
        )])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AlbumUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_photo: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PhotoCreate {
    pub photo_title: String,
    pub image_url: String,
}

impl PhotoCreate {
    /// # Errors
    ///
    /// `Error::Validation` when the title or image URL is blank.
    pub fn validate(&self) -> Result<()> {
        collect(vec![
            validate::required("photo_title", &self.photo_title, "Please add a photo title"),
            validate::required("image_url", &self.image_url, "Please add a photo image URL"),
        ])
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PhotoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Merge per-field results into one validation error.
fn collect(results: Vec<Result<()>>) -> Result<()> {
    let fields: Vec<_> = results
        .into_iter()
        .filter_map(|r| match r {
            Err(Error::Validation { fields }) => Some(fields),
            _ => None,
        })
        .flatten()
        .collect();

    if fields.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { fields })
    }
}
