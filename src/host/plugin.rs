//! Lifecycle seen by a host pipeline: init once, flush many times, shut down.
//!
//! The host's own ABI glue stays outside this crate; it only needs to turn its
//! callbacks into calls on an [`OutputPlugin`] and hand back
//! [`FlushOutcome::code`].

use super::decoder::RecordDecoder;
use crate::config::types::Config;
use crate::flush::{FlushOutcome, Flusher};
use crate::storage::{BucketStore, ObjectWriter, StoreBuildError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to open bucket '{bucket}': {source}")]
    Storage {
        bucket: String,
        #[source]
        source: StoreBuildError,
    },

    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[async_trait]
pub trait OutputPlugin: Sized + Send + Sync {
    async fn init(config: Config) -> Result<Self, PluginError>;

    async fn flush(&self, tag: &str, decoder: &mut dyn RecordDecoder) -> FlushOutcome;

    async fn shutdown(self) -> FlushOutcome;
}

/// Output that writes every flush to an object-store bucket.
pub struct BucketOutput {
    flusher: Flusher,
}

impl BucketOutput {
    /// Build from an explicit writer instead of the configured provider.
    pub fn with_writer(config: &Config, writer: Arc<dyn ObjectWriter>) -> Self {
        Self {
            flusher: Flusher::new(writer, &config.output),
        }
    }

    pub fn flusher(&self) -> &Flusher {
        &self.flusher
    }
}

#[async_trait]
impl OutputPlugin for BucketOutput {
    async fn init(config: Config) -> Result<Self, PluginError> {
        let store = BucketStore::new(config.storage.clone());

        // Open the default bucket now so bad credentials fail at startup
        // rather than on the first flush.
        store
            .store_for(&config.output.bucket)
            .map_err(|source| PluginError::Storage {
                bucket: config.output.bucket.clone(),
                source,
            })?;

        info!(
            provider = %config.storage.provider,
            region = config.storage.region.as_deref().unwrap_or(""),
            bucket = %config.output.bucket,
            prefix = %config.output.prefix,
            "Output initialized"
        );

        Ok(Self::with_writer(&config, Arc::new(store)))
    }

    async fn flush(&self, tag: &str, decoder: &mut dyn RecordDecoder) -> FlushOutcome {
        self.flusher.flush(tag, decoder).await
    }

    async fn shutdown(self) -> FlushOutcome {
        info!("Output shut down");
        FlushOutcome::Processed
    }
}

/// Synchronous facade for hosts that call in from their own threads.
///
/// Each call blocks the calling thread until the flush finishes. Calls from
/// several threads at once are independent.
pub struct BlockingOutput<P = BucketOutput> {
    runtime: tokio::runtime::Runtime,
    inner: P,
}

impl<P: OutputPlugin> BlockingOutput<P> {
    pub fn init(config: Config) -> Result<Self, PluginError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let inner = runtime.block_on(P::init(config))?;
        Ok(Self { runtime, inner })
    }

    pub fn flush(&self, tag: &str, decoder: &mut dyn RecordDecoder) -> FlushOutcome {
        self.runtime.block_on(self.inner.flush(tag, decoder))
    }

    pub fn shutdown(self) -> FlushOutcome {
        let Self { runtime, inner } = self;
        runtime.block_on(inner.shutdown())
    }
}
