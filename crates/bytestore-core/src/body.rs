//! Object bodies accepted by `put`.

use bytes::Bytes;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

/// A value ready to be written to a key.
///
/// Raw bytes and text pass through unchanged. Structured values go through
/// [`Body::json`], which serializes them up front so an encoding failure is
/// reported before any request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Opaque bytes, stored verbatim.
    Bytes(Bytes),
    /// Text, stored as UTF-8.
    Text(String),
    /// Compact JSON produced by `serde_json`.
    Json(Bytes),
}

impl Body {
    /// Serialize `value` to JSON.
    ///
    /// `key` only labels the error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encoding`] if `value` cannot be represented as JSON
    /// (for example a map with non-string keys).
    pub fn json<T: Serialize + ?Sized>(key: &str, value: &T) -> StoreResult<Self> {
        serde_json::to_vec(value)
            .map(|v| Self::Json(Bytes::from(v)))
            .map_err(|source| StoreError::Encoding {
                key: key.to_owned(),
                source,
            })
    }

    /// `Content-Type` sent with the object.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "application/octet-stream",
            Self::Text(_) => "text/plain; charset=utf-8",
            Self::Json(_) => "application/json",
        }
    }

    /// Byte view of the body.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(b) | Self::Json(b) => &b[..],
            Self::Text(s) => s.as_bytes(),
        }
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume into the bytes that will be stored.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Bytes(b) | Self::Json(b) => b,
            Self::Text(s) => Bytes::from(s),
        }
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<&[u8]> for Body {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}
