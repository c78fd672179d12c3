//! Store configuration.
//!
//! Provides [`StoreConfig`], the fully-resolved set of values an
//! [`S3Store`](crate::S3Store) is built from. Only the bucket is required;
//! credentials, region and endpoint are otherwise left to the AWS SDK's
//! default discovery chain.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{StoreError, StoreResult};

/// Environment variable naming the target bucket.
pub const BUCKET_ENV: &str = "S3_BUCKET";

/// Storage client configuration.
///
/// Build one explicitly with [`StoreConfig::builder`], or resolve it from the
/// process environment with [`StoreConfig::from_env`].
///
/// # Examples
///
/// ```
/// use bytestore_core::StoreConfig;
///
/// let config = StoreConfig::builder().bucket("my-bucket".into()).build();
/// assert_eq!(config.bucket, "my-bucket");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Target bucket. Every operation is issued against this bucket.
    pub bucket: String,

    /// Region override. `None` defers to the SDK chain (`AWS_REGION`, profile).
    #[builder(default, setter(strip_option, into))]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible services (LocalStack, MinIO, ...).
    #[builder(default, setter(strip_option, into))]
    pub endpoint_url: Option<String>,

    /// Use path-style addressing (`http://host/bucket/key`).
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Deadline applied to each operation, body transfer included.
    #[builder(default, setter(strip_option))]
    pub operation_timeout: Option<Duration>,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Required |
    /// |----------|----------|
    /// | `S3_BUCKET` | yes |
    /// | `S3_ENDPOINT_URL` | no |
    /// | `S3_REGION` | no |
    /// | `S3_FORCE_PATH_STYLE` | no (`1` / `true`) |
    /// | `S3_OPERATION_TIMEOUT_SECS` | no |
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the bucket is missing or empty, or if
    /// the timeout is not a positive whole number of seconds.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// [`StoreConfig::from_env`] is this function over `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bucket = non_empty(BUCKET_ENV).ok_or_else(|| {
            StoreError::Config(format!("{BUCKET_ENV} environment variable must be set"))
        })?;

        let operation_timeout = match non_empty("S3_OPERATION_TIMEOUT_SECS") {
            Some(v) => {
                let secs = v.trim().parse::<u64>().map_err(|e| {
                    StoreError::Config(format!("invalid S3_OPERATION_TIMEOUT_SECS {v:?}: {e}"))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let config = Self {
            bucket,
            region: non_empty("S3_REGION"),
            endpoint_url: non_empty("S3_ENDPOINT_URL"),
            force_path_style: non_empty("S3_FORCE_PATH_STYLE").is_some_and(|v| parse_bool(&v)),
            operation_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants every store relies on.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the bucket name is empty or the
    /// operation timeout is zero.
    pub fn validate(&self) -> StoreResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(StoreError::Config("bucket name must not be empty".to_owned()));
        }
        if self.operation_timeout == Some(Duration::ZERO) {
            return Err(StoreError::Config(
                "operation timeout must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
