use async_trait::async_trait;
use bytes::Bytes;

/// Durable sink for encoded batches.
///
/// Implementations must be safe to call from concurrent flushes; each call
/// uploads one whole object in a single shot.
#[async_trait]
pub trait ObjectWriter: Send + Sync {
    async fn write(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), WriteError>;
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("failed to open bucket '{bucket}': {source}")]
    Bucket {
        bucket: String,
        #[source]
        source: StoreBuildError,
    },

    #[error("'{key}' is not a valid object path: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: object_store::path::Error,
    },
}

impl WriteError {
    /// A key the store cannot represent will fail the same way every time.
    pub fn is_transient(&self) -> bool {
        !matches!(self, WriteError::InvalidKey { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreBuildError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{provider} storage requires '{field}' to be set")]
    MissingField {
        provider: &'static str,
        field: &'static str,
    },
}
