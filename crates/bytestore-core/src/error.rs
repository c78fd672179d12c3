//! Error types for the storage client.
//!
//! [`StoreError`] separates the four ways a call can fail: bad configuration,
//! a value that would not serialize, bytes that would not deserialize, and
//! anything the storage backend reported. Backend failures keep the original
//! error as their [`source`](std::error::Error::source) and carry a
//! [`StorageErrorKind`] so callers can branch on not-found without
//! downcasting.

use std::fmt;

/// Boxed backend error, kept as-is.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    /// The key (or bucket) does not exist.
    NotFound,
    /// Credentials were rejected or lack permission.
    AccessDenied,
    /// The operation deadline expired.
    Timeout,
    /// The request never produced a usable response (connect, I/O, body read).
    Transport,
    /// The request was rejected before or by the backend as malformed.
    InvalidRequest,
    /// Any other error response from the service.
    Service,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::AccessDenied => "access denied",
            Self::Timeout => "timed out",
            Self::Transport => "transport failure",
            Self::InvalidRequest => "invalid request",
            Self::Service => "service error",
        };
        f.write_str(s)
    }
}

/// Storage client error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Required configuration is missing or invalid. Construction cannot proceed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A structured value could not be serialized. No request was sent.
    #[error("failed to encode value for {key}")]
    Encoding {
        /// Target key of the write.
        key: String,
        /// The serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// Stored bytes could not be deserialized into the requested type.
    #[error("failed to decode {key}")]
    Decoding {
        /// Key that was read.
        key: String,
        /// The deserializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The backend call failed.
    #[error("{op} {key}: {kind}")]
    Storage {
        /// Operation name (`get`, `put`, ...).
        op: &'static str,
        /// Key, or prefix for listings.
        key: String,
        /// Classification of the failure.
        kind: StorageErrorKind,
        /// The underlying error, unaltered.
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    /// Build a [`StoreError::Storage`].
    pub fn storage(
        op: &'static str,
        key: impl Into<String>,
        kind: StorageErrorKind,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Storage {
            op,
            key: key.into(),
            kind,
            source: source.into(),
        }
    }

    /// The backend failure kind, if this is a storage error.
    #[must_use]
    pub fn kind(&self) -> Option<StorageErrorKind> {
        match self {
            Self::Storage { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the backend reported the key (or bucket) as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(StorageErrorKind::NotFound)
    }

    /// Whether the operation deadline expired.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind() == Some(StorageErrorKind::Timeout)
    }
}

/// Convenience result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
