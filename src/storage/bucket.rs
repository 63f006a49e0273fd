//! [`ObjectWriter`] backed by the `object_store` crate.
//!
//! `object_store` clients are bound to a single bucket, while flushes name
//! their bucket per call. [`BucketStore`] keeps one client per bucket, built
//! on first use from the configured provider.

use super::traits::{ObjectWriter, StoreBuildError, WriteError};
use crate::config::types::{StorageConfig, StorageProvider};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

pub struct BucketStore {
    config: StorageConfig,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl BucketStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn provider(&self) -> StorageProvider {
        self.config.provider
    }

    /// Client for `bucket`, building and caching it if needed.
    ///
    /// The cache lock is only held while looking up or inserting, never while
    /// a client is in use.
    pub fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StoreBuildError> {
        if let Some(store) = self.lock_stores().get(bucket) {
            return Ok(store.clone());
        }

        let store = build_store(&self.config, bucket)?;
        info!(bucket = %bucket, provider = %self.config.provider, "Opened bucket");

        // A concurrent caller may have built one too; keep whichever landed first
        let store = self
            .lock_stores()
            .entry(bucket.to_string())
            .or_insert(store)
            .clone();

        Ok(store)
    }

    fn lock_stores(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<dyn ObjectStore>>> {
        self.stores
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ObjectWriter for BucketStore {
    async fn write(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), WriteError> {
        let store = self.store_for(bucket).map_err(|source| WriteError::Bucket {
            bucket: bucket.to_string(),
            source,
        })?;

        // Stored path must equal the key as reported; Path::from would escape it
        let path = Path::parse(key).map_err(|source| WriteError::InvalidKey {
            key: key.to_string(),
            source,
        })?;

        let size = body.len();
        store.put(&path, PutPayload::from(body)).await?;
        debug!(bucket = %bucket, key = %key, bytes = size, "Object written");

        Ok(())
    }
}

fn build_store(
    config: &StorageConfig,
    bucket: &str,
) -> Result<Arc<dyn ObjectStore>, StoreBuildError> {
    let store: Arc<dyn ObjectStore> = match config.provider {
        StorageProvider::Gcs => {
            let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
            // Without an explicit key file the ambient credentials are used
            if let Some(credential) = &config.credential {
                builder = builder.with_service_account_path(credential.to_string_lossy());
            }
            Arc::new(builder.build()?)
        }
        StorageProvider::S3 => {
            let mut builder = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .with_allow_http(config.allow_http);
            if let Some(region) = &config.region {
                builder = builder.with_region(region);
            }
            if let Some(endpoint) = &config.endpoint {
                builder = builder.with_endpoint(endpoint);
            }
            Arc::new(builder.build()?)
        }
        StorageProvider::Local => {
            let root = config.root.as_ref().ok_or(StoreBuildError::MissingField {
                provider: "local",
                field: "root",
            })?;
            let dir = root.join(bucket);
            std::fs::create_dir_all(&dir)?;
            Arc::new(LocalFileSystem::new_with_prefix(&dir)?)
        }
        StorageProvider::Memory => Arc::new(InMemory::new()),
    };

    Ok(store)
}
