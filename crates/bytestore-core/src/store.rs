//! The storage interface.
//!
//! [`ObjectStore`] is the object-safe core: five round-trips against one
//! bucket. [`StoreExt`] layers JSON on top of it and is implemented for every
//! store, `dyn ObjectStore` included.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::body::Body;
use crate::error::{StoreError, StoreResult};

/// Operations against a single bucket.
///
/// Every call is one independent request. Implementations log one TRACE
/// event per call and return backend failures as [`StoreError::Storage`]
/// without retrying.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bound bucket.
    fn bucket(&self) -> &str;

    /// Delete the object at `key`. Deleting a missing key is not an error on S3.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Read the full body of the object at `key`.
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// Write `body` to `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Body) -> StoreResult<()>;

    /// List up to `max_keys` keys starting with `prefix`, in ascending order,
    /// strictly after `start_after` (empty for the beginning).
    ///
    /// One page only: to continue, call again with the last returned key.
    async fn keys(
        &self,
        prefix: &str,
        start_after: &str,
        max_keys: i32,
    ) -> StoreResult<Vec<String>>;

    /// Presigned GET URL for `key`, valid for `expires_minutes`.
    ///
    /// The object is not required to exist.
    async fn url(&self, key: &str, expires_minutes: u64) -> StoreResult<String>;
}

/// JSON helpers for any [`ObjectStore`].
#[async_trait]
pub trait StoreExt: ObjectStore {
    /// Serialize `value` to JSON and write it to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encoding`] without contacting the backend if
    /// `value` cannot be serialized.
    async fn put_json<T>(&self, key: &str, value: &T) -> StoreResult<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let body = match Body::json(key, value) {
            Ok(body) => body,
            Err(err) => {
                trace!(bucket = self.bucket(), key, error = %err, "put");
                return Err(err);
            }
        };
        self.put(key, body).await
    }

    /// Read `key` and decode it from JSON.
    ///
    /// The result is built fresh; nothing is returned unless decoding succeeds.
    ///
    /// # Errors
    ///
    /// Propagates [`ObjectStore::get`] failures, and returns
    /// [`StoreError::Decoding`] if the bytes are not a valid `T`.
    async fn find<T>(&self, key: &str) -> StoreResult<T>
    where
        T: DeserializeOwned + Send,
    {
        let result = self.get(key).await.and_then(|body| {
            serde_json::from_slice::<T>(&body)
                .map(|value| (value, body))
                .map_err(|source| StoreError::Decoding {
                    key: key.to_owned(),
                    source,
                })
        });

        match result {
            Ok((value, body)) => {
                trace!(
                    bucket = self.bucket(),
                    key,
                    body = %String::from_utf8_lossy(&body),
                    "find"
                );
                Ok(value)
            }
            Err(err) => {
                trace!(bucket = self.bucket(), key, error = %err, "find");
                Err(err)
            }
        }
    }
}

impl<S: ObjectStore + ?Sized> StoreExt for S {}
