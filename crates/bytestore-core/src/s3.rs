//! S3-backed [`ObjectStore`].
//!
//! [`S3Store`] binds one bucket to an `aws_sdk_s3::Client` and maps each
//! operation onto a single S3 API call:
//!
//! | Operation | S3 call |
//! |-----------|---------|
//! | `delete` | `DeleteObject` |
//! | `get` | `GetObject`, body collected in full |
//! | `put` | `PutObject` |
//! | `keys` | `ListObjectsV2` with `prefix`, `start-after`, `max-keys` |
//! | `url` | presigned `GetObject` |
//!
//! Retries, credentials and connection pooling are whatever the SDK client is
//! configured with; nothing is added here.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use bytes::Bytes;
use tracing::{debug, trace};

use crate::body::Body;
use crate::config::StoreConfig;
use crate::error::{StorageErrorKind, StoreError, StoreResult};
use crate::store::ObjectStore;

/// Storage client for one S3 bucket.
///
/// Cloning is cheap and clones share the SDK's connection pool.
#[derive(Debug, Clone)]
pub struct S3Store {
    bucket: String,
    client: Client,
    operation_timeout: Option<Duration>,
}

impl S3Store {
    /// Resolve [`StoreConfig`] from the environment and connect.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `S3_BUCKET` is missing or empty.
    pub async fn from_env() -> StoreResult<Self> {
        Self::connect(StoreConfig::from_env()?).await
    }

    /// Load the ambient AWS configuration and connect.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `config` is invalid.
    pub async fn connect(config: StoreConfig) -> StoreResult<Self> {
        Self::connect_with(config, |loader| loader).await
    }

    /// Like [`S3Store::connect`], with a hook over the SDK config loader.
    ///
    /// The hook runs after the region and endpoint from `config` are applied,
    /// so it can override them, install a credentials provider, pick a
    /// profile, and so on.
    ///
    /// ```no_run
    /// # async fn run() -> bytestore_core::StoreResult<()> {
    /// use bytestore_core::{S3Store, StoreConfig};
    ///
    /// let config = StoreConfig::builder().bucket("bytes-db".into()).build();
    /// let store = S3Store::connect_with(config, |loader| loader.profile_name("dev")).await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `config` is invalid.
    pub async fn connect_with<F>(config: StoreConfig, customize: F) -> StoreResult<Self>
    where
        F: FnOnce(ConfigLoader) -> ConfigLoader,
    {
        config.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = customize(loader).load().await;

        Self::from_sdk_config(config, &sdk_config)
    }

    /// Build from an already-loaded SDK configuration.
    ///
    /// Does not read the environment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `config` is invalid.
    pub fn from_sdk_config(config: StoreConfig, sdk_config: &SdkConfig) -> StoreResult<Self> {
        config.validate()?;

        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(config.force_path_style)
            .build();
        let client = Client::from_conf(s3_config);

        debug!(
            bucket = %config.bucket,
            region = ?sdk_config.region(),
            endpoint = ?sdk_config.endpoint_url(),
            force_path_style = config.force_path_style,
            operation_timeout = ?config.operation_timeout,
            "created S3 store"
        );

        Ok(Self {
            bucket: config.bucket,
            client,
            operation_timeout: config.operation_timeout,
        })
    }

    /// The underlying SDK client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn read_object(&self, key: &str) -> StoreResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("get", key, e))?;

        // The body stream is owned here and dropped on every exit path.
        let body = output.body.collect().await.map_err(|e| {
            StoreError::storage("get", key, StorageErrorKind::Transport, e)
        })?;
        Ok(body.into_bytes())
    }

    async fn write_object(&self, key: &str, content_type: &str, body: Bytes) -> StoreResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| storage_error("put", key, e))?;
        Ok(())
    }

    async fn list_keys(
        &self,
        prefix: &str,
        start_after: &str,
        max_keys: i32,
    ) -> StoreResult<Vec<String>> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .set_start_after((!start_after.is_empty()).then(|| start_after.to_owned()))
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|e| storage_error("keys", prefix, e))?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|obj| obj.key())
            .map(ToOwned::to_owned)
            .collect())
    }

    async fn presign(&self, key: &str, expires_minutes: u64) -> StoreResult<String> {
        let expires_in = Duration::from_secs(expires_minutes.saturating_mul(60));
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StoreError::storage("url", key, StorageErrorKind::InvalidRequest, e))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| storage_error("url", key, e))?;
        Ok(request.uri().to_owned())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let result = with_deadline("delete", key, self.operation_timeout, async {
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| storage_error("delete", key, e))
        })
        .await;

        trace!(
            bucket = %self.bucket,
            key,
            error = result.as_ref().err().map(tracing::field::display),
            "delete"
        );
        result
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let result = with_deadline("get", key, self.operation_timeout, self.read_object(key)).await;

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
        let content_type = body.content_type();
        let bytes = body.into_bytes();
        let result = with_deadline(
            "put",
            key,
            self.operation_timeout,
            self.write_object(key, content_type, bytes.clone()),
        )
        .await;

        trace!(
            bucket = %self.bucket,
            key,
            body = %String::from_utf8_lossy(&bytes),
            error = result.as_ref().err().map(tracing::field::display),
            "put"
        );
        result
    }

    async fn keys(
        &self,
        prefix: &str,
        start_after: &str,
        max_keys: i32,
    ) -> StoreResult<Vec<String>> {
        let result = with_deadline(
            "keys",
            prefix,
            self.operation_timeout,
            self.list_keys(prefix, start_after, max_keys),
        )
        .await;

        trace!(
            bucket = %self.bucket,
            prefix,
            after = start_after,
            max = max_keys,
            keys = result.as_ref().ok().map(tracing::field::debug),
            error = result.as_ref().err().map(tracing::field::display),
            "keys"
        );
        result
    }

    async fn url(&self, key: &str, expires_minutes: u64) -> StoreResult<String> {
        let result = with_deadline(
            "url",
            key,
            self.operation_timeout,
            self.presign(key, expires_minutes),
        )
        .await;

        trace!(
            bucket = %self.bucket,
            key,
            expires = expires_minutes,
            url = result.as_ref().ok().map(tracing::field::display),
            error = result.as_ref().err().map(tracing::field::display),
            "url"
        );
        result
    }
}

/// Run `fut` under the optional deadline.
///
/// On expiry the future is dropped, releasing whatever it held, and a
/// [`StorageErrorKind::Timeout`] error is returned.
async fn with_deadline<T, F>(
    op: &'static str,
    key: &str,
    timeout: Option<Duration>,
    fut: F,
) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or_else(|elapsed| {
                Err(StoreError::storage(op, key, StorageErrorKind::Timeout, elapsed))
            }),
        None => fut.await,
    }
}

/// Wrap an SDK failure, classifying it by SDK variant, error code, then HTTP status.
fn storage_error<E>(op: &'static str, key: &str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let kind = classify(&err);
    StoreError::storage(op, key, kind, err)
}

fn classify<E: ProvideErrorMetadata>(err: &SdkError<E, HttpResponse>) -> StorageErrorKind {
    let by_variant = match err {
        SdkError::TimeoutError(_) => Some(StorageErrorKind::Timeout),
        SdkError::DispatchFailure(failure) if failure.is_timeout() => {
            Some(StorageErrorKind::Timeout)
        }
        SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            Some(StorageErrorKind::Transport)
        }
        SdkError::ConstructionFailure(_) => Some(StorageErrorKind::InvalidRequest),
        _ => None,
    };

    by_variant
        .or_else(|| err.code().and_then(kind_for_code))
        .unwrap_or_else(|| {
            err.raw_response()
                .map_or(StorageErrorKind::Service, |raw| {
                    kind_for_status(raw.status().as_u16())
                })
        })
}

fn kind_for_code(code: &str) -> Option<StorageErrorKind> {
    match code {
        "NoSuchKey" | "NoSuchBucket" | "NotFound" => Some(StorageErrorKind::NotFound),
        "AccessDenied" | "Forbidden" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" => {
            Some(StorageErrorKind::AccessDenied)
        }
        "InvalidArgument" | "InvalidRequest" | "KeyTooLongError" => {
            Some(StorageErrorKind::InvalidRequest)
        }
        "RequestTimeout" => Some(StorageErrorKind::Timeout),
        _ => None,
    }
}

fn kind_for_status(status: u16) -> StorageErrorKind {
    match status {
        404 => StorageErrorKind::NotFound,
        401 | 403 => StorageErrorKind::AccessDenied,
        400 => StorageErrorKind::InvalidRequest,
        408 => StorageErrorKind::Timeout,
        _ => StorageErrorKind::Service,
    }
}
