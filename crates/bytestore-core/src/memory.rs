//! In-memory [`ObjectStore`].
//!
//! Keys live in a `BTreeMap`, so they are always sorted and listings follow
//! the same ascending, exclusive-cursor order as S3 `ListObjectsV2`. Useful
//! for tests and local runs; URLs it issues use a `memory://` scheme and
//! cannot be fetched.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::trace;

use crate::body::Body;
use crate::error::{StorageErrorKind, StoreError, StoreResult};
use crate::store::ObjectStore;

/// Longest presign expiry S3 accepts (one week).
const MAX_URL_EXPIRY_MINUTES: u64 = 7 * 24 * 60;

/// Thread-safe in-memory bucket.
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create an empty bucket.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    fn list(&self, prefix: &str, start_after: &str, max_keys: usize) -> Vec<String> {
        // Keys sharing a prefix are contiguous, so start at whichever of the
        // prefix or the cursor sorts last and stop at the first non-match.
        let lower = if start_after >= prefix {
            Bound::Excluded(start_after)
        } else {
            Bound::Included(prefix)
        };

        self.objects
            .read()
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .take(max_keys)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.objects.write().remove(key);
        trace!(bucket = %self.bucket, key, "delete");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let result = self.objects.read().get(key).cloned().ok_or_else(|| {
            StoreError::storage(
                "get",
                key,
                StorageErrorKind::NotFound,
                "The specified key does not exist.",
            )
        });

        match &result {
            Ok(body) => trace!(
                bucket = %self.bucket,
                key,
                body = %String::from_utf8_lossy(body),
                "get"
            ),
            Err(err) => trace!(bucket = %self.bucket, key, error = %err, "get"),
        }
        result
    }

    async fn put(&self, key: &str, body: Body) -> StoreResult<()> {
        let bytes = body.into_bytes();
        trace!(
            bucket = %self.bucket,
            key,
            body = %String::from_utf8_lossy(&bytes),
            "put"
        );
        self.objects.write().insert(key.to_owned(), bytes);
        Ok(())
    }

    async fn keys(
        &self,
        prefix: &str,
        start_after: &str,
        max_keys: i32,
    ) -> StoreResult<Vec<String>> {
        let keys = self.list(prefix, start_after, usize::try_from(max_keys).unwrap_or(0));
        trace!(
            bucket = %self.bucket,
            prefix,
            after = start_after,
            max = max_keys,
            keys = ?keys,
            "keys"
        );
        Ok(keys)
    }

    async fn url(&self, key: &str, expires_minutes: u64) -> StoreResult<String> {
        if expires_minutes > MAX_URL_EXPIRY_MINUTES {
            let err = StoreError::storage(
                "url",
                key,
                StorageErrorKind::InvalidRequest,
                format!("presigned URL expiry must not exceed {MAX_URL_EXPIRY_MINUTES} minutes"),
            );
            trace!(bucket = %self.bucket, key, expires = expires_minutes, error = %err, "url");
            return Err(err);
        }

        let url = format!(
            "memory://{}/{key}?X-Amz-Expires={}",
            self.bucket,
            expires_minutes.saturating_mul(60)
        );
        trace!(bucket = %self.bucket, key, expires = expires_minutes, url = %url, "url");
        Ok(url)
    }
}
