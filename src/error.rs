//! Error types for the gallery data-access layer.
//!
//! Every failure that can reach a caller is one variant of [`Error`], so list
//! screens and mutation callers match exhaustively instead of probing loosely
//! typed response bodies.

use serde::Deserialize;
use std::fmt;

/// Result type for gallery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Text shown to users for failures that carry no useful server message.
pub const GENERIC_MESSAGE: &str = "Something went wrong.";

/// One field-level problem reported by the server (HTTP 422) or by a local
/// form rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    /// Location of the offending value, e.g. `["body", "email"]`.
    #[serde(default, deserialize_with = "deserialize_loc")]
    pub loc: Vec<String>,
    /// Human readable message.
    pub msg: String,
    /// Machine readable error type, e.g. `value_error.missing`.
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl FieldError {
    pub fn new(field: &str, msg: impl Into<String>) -> Self {
        FieldError {
            loc: vec!["body".to_string(), field.to_string()],
            msg: msg.into(),
            kind: "value_error".to_string(),
        }
    }

    /// The last path segment, usually the form field name.
    pub fn field(&self) -> Option<&str> {
        self.loc.last().map(String::as_str)
    }
}

// `loc` mixes strings and integer indices.
fn deserialize_loc<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

/// Error taxonomy for API, cache and session operations.
///
/// The type is `Clone` because the query cache hands the same outcome to every
/// caller that joined a de-duplicated request.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The request never produced a response: connection refused, DNS failure,
    /// timeout.
    ///
    /// **Recovery:** Not retried automatically. The caller may retry.
    Network(String),

    /// The payload was rejected, either by the server (HTTP 422) or by a local
    /// form rule before any request was sent.
    Validation {
        /// Field problems in the order reported.
        fields: Vec<FieldError>,
    },

    /// The requested resource does not exist (HTTP 404).
    NotFound(String),

    /// Missing or rejected credentials (HTTP 401/403).
    Unauthorized(String),

    /// Any other non-success status.
    Api {
        /// HTTP status code
        status: u16,
        /// `detail` from the body, or the canonical status reason
        message: String,
    },

    /// A value could not be encoded for the cache or the wire.
    Serialization(String),

    /// A response body or cache entry could not be decoded.
    Deserialization(String),

    /// Cache entry header is invalid (bad magic, broken envelope).
    ///
    /// **Recovery:** The entry is dropped and reloaded on the next fetch.
    InvalidCacheEntry(String),

    /// Cached entry was written by a different schema version.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// `FetchStrategy::Fresh` found no usable cached value.
    CacheMiss,

    /// Invalid client configuration.
    Config(String),

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// Build a validation error for a single field.
    pub fn invalid_field(field: &str, msg: impl Into<String>) -> Self {
        Error::Validation {
            fields: vec![FieldError::new(field, msg)],
        }
    }

    /// Message suitable for a toast or inline form error.
    ///
    /// Validation errors surface only their first message; field messages are
    /// not mapped back to individual inputs.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { fields } => fields
                .first()
                .map(|f| f.msg.clone())
                .unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
            Error::NotFound(msg) | Error::Unauthorized(msg) | Error::Api { message: msg, .. }
                if !msg.is_empty() =>
            {
                msg.clone()
            }
            _ => GENERIC_MESSAGE.to_string(),
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    /// Whether the error came from decoding a cached entry rather than from a
    /// loader.
    pub fn is_cache_decode(&self) -> bool {
        matches!(
            self,
            Error::Deserialization(_) | Error::InvalidCacheEntry(_) | Error::VersionMismatch { .. }
        )
    }

    /// Map a non-success HTTP status and its body to an error variant.
    ///
    /// Bodies follow `{detail: string | [{loc, msg, type}]}`; anything else
    /// falls back to the status reason.
    pub fn from_status(status: u16, body: &str) -> Self {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Detail {
            Text(String),
            Fields(Vec<FieldError>),
        }

        #[derive(Deserialize)]
        struct Body {
            detail: Detail,
        }

        let reason = || {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown error")
                .to_string()
        };

        let (fields, text) = match serde_json::from_str::<Body>(body).map(|b| b.detail) {
            Ok(Detail::Fields(fields)) => (Some(fields), None),
            Ok(Detail::Text(text)) => (None, Some(text)),
            Err(_) => (None, None),
        };

        match (status, fields) {
            (_, Some(fields)) => Error::Validation { fields },
            (422, None) => Error::Validation {
                fields: text
                    .map(|msg| FieldError {
                        loc: Vec::new(),
                        msg,
                        kind: String::new(),
                    })
                    .into_iter()
                    .collect(),
            },
            (404, None) => Error::NotFound(text.unwrap_or_else(reason)),
            (401 | 403, None) => Error::Unauthorized(text.unwrap_or_else(reason)),
            (status, None) => Error::Api {
                status,
                message: text.unwrap_or_else(reason),
            },
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Network(msg) => write!(f, "Network error: {}", msg),
            Error::Validation { fields } => {
                write!(f, "Validation error")?;
                for (i, field) in fields.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    match field.field() {
                        Some(name) => write!(f, "{}{}: {}", sep, name, field.msg)?,
                        None => write!(f, "{}{}", sep, field.msg)?,
                    }
                }
                Ok(())
            }
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Error::Api { status, message } => write!(f, "API error {}: {}", status, message),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::CacheMiss => write!(f, "Cache miss"),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            Error::from_status(status.as_u16(), "")
        } else if e.is_decode() {
            Error::Deserialization(e.to_string())
        } else if e.is_builder() {
            Error::Config(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::Other(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::Deserialization(e.to_string())
        } else {
            Error::Serialization(e.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Config(format!("invalid URL: {}", e))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Other(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
