use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub output: OutputConfig,
    pub storage: StorageConfig,
}

/// Where and how flushed batches are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default bucket for every flush.
    pub bucket: String,
    /// Default key prefix; empty means keys start at the tag.
    #[serde(default)]
    pub prefix: String,
    /// Field name the resolved event time is written under.
    #[serde(default = "default_time_key")]
    pub time_key: String,
    #[serde(default)]
    pub on_invalid_key: InvalidKeyPolicy,
}

pub fn default_time_key() -> String {
    "ts".to_string()
}

/// What to do with a record field whose key is not a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidKeyPolicy {
    /// Fail the whole batch.
    #[default]
    Fail,
    /// Drop the offending field and keep going.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    /// Service-account key file for `gcs`.
    pub credential: Option<PathBuf>,
    pub region: Option<String>,
    /// Root directory for `local`; each bucket is a subdirectory.
    pub root: Option<PathBuf>,
    /// Custom endpoint for S3-compatible services.
    pub endpoint: Option<String>,
    #[serde(default)]
    pub allow_http: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Gcs,
    S3,
    Local,
    Memory,
}

impl std::fmt::Display for StorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageProvider::Gcs => write!(f, "gcs"),
            StorageProvider::S3 => write!(f, "s3"),
            StorageProvider::Local => write!(f, "local"),
            StorageProvider::Memory => write!(f, "memory"),
        }
    }
}

impl StorageConfig {
    /// In-memory storage, used by tests and dry runs.
    pub fn memory() -> Self {
        Self {
            provider: StorageProvider::Memory,
            credential: None,
            region: None,
            root: None,
            endpoint: None,
            allow_http: false,
        }
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            provider: StorageProvider::Local,
            root: Some(root.into()),
            ..Self::memory()
        }
    }
}

impl OutputConfig {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            time_key: default_time_key(),
            on_invalid_key: InvalidKeyPolicy::default(),
        }
    }
}
