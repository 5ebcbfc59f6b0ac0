//! Object-store backends for published artifacts.
//!
//! The service only needs two operations: an existence/freshness probe and
//! an idempotent put. Backend selection is an enum rather than a trait
//! object so the async methods stay plain.

pub mod memory;
pub mod object_store;

pub use memory::MemStorage;
pub use object_store::ObjectStorage;

use crate::infra::config::{Config, StorageBackendKind};
use crate::infra::error::{StubError, StubResult};

/// Objects are considered fresh for this long after their last write.
pub const OBJECT_EXPIRY_SECS: u64 = 24 * 60 * 60;

/// Cache lifetime advertised on stored objects.
pub const OBJECT_CACHE_CONTROL: &str = "max-age=1800";

/// A configured storage backend.
pub enum Storage {
    Memory(MemStorage),
    ObjectStore(ObjectStorage),
}

impl Storage {
    /// Build the backend selected by the configuration.
    pub async fn from_config(config: &Config) -> StubResult<Self> {
        match config.storage_backend {
            Some(StorageBackendKind::S3) => Ok(Storage::ObjectStore(
                ObjectStorage::new_s3(&config.bucket).await,
            )),
            Some(StorageBackendKind::Gcs) => Ok(Storage::ObjectStore(
                ObjectStorage::new_gcs(&config.bucket).await,
            )),
            None => Err(StubError::Configuration(
                "no storage backend configured".into(),
            )),
        }
    }

    /// Whether a fresh object already exists at `key`.
    pub async fn exists(&self, key: &str) -> bool {
        match self {
            Storage::Memory(storage) => storage.exists(key),
            Storage::ObjectStore(storage) => storage.exists(key).await,
        }
    }

    /// Write `body` at `key` with public-read access and the standard
    /// cache-control header.
    pub async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> StubResult<()> {
        match self {
            Storage::Memory(storage) => storage.put(key, content_type, body),
            Storage::ObjectStore(storage) => storage.put(key, content_type, body).await,
        }
    }
}
