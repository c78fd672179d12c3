//! Thin object-storage client for S3 and S3-compatible services.
//!
//! One bucket, six operations: `delete`, `get`, `put`, `keys`, `url` and
//! `find`. The first five are the object-safe [`ObjectStore`] trait; `find`
//! and `put_json` come from [`StoreExt`], which every store gets for free.
//!
//! # Architecture
//!
//! ```text
//!   StoreConfig (S3_BUCKET, endpoint, timeout)
//!        |
//!        v
//!   S3Store ──── aws_sdk_s3::Client ──── S3 / LocalStack / MinIO
//!        |
//!   ObjectStore + StoreExt
//!        |
//!   MemoryStore (in-process, same contract)
//! ```
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> bytestore_core::StoreResult<()> {
//! use bytestore_core::{Body, ObjectStore, S3Store, StoreExt};
//!
//! let store = S3Store::from_env().await?;
//! store.put("users/ABC/_.json", Body::from(r#"{"id":"ABC"}"#)).await?;
//! let user: serde_json::Value = store.find("users/ABC/_.json").await?;
//! let next = store.keys("users/", "users/ABC/_.json", 10).await?;
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod config;
pub mod error;
pub mod memory;
pub mod s3;
pub mod store;


pub use body::Body;
pub use config::StoreConfig;
pub use error::{StorageErrorKind, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use s3::S3Store;
pub use store::{ObjectStore, StoreExt};
