use super::normalize::{NormalizeError, Normalizer};
use crate::config::types::{default_time_key, InvalidKeyPolicy};
use crate::flush::batch::Batch;
use crate::record::format_rfc3339;
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("record {index}: {source}")]
    Normalize {
        index: usize,
        #[source]
        source: NormalizeError,
    },

    #[error("record {index}: failed to serialize JSON: {source}")]
    Json {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl EncodeError {
    /// Whether retrying the same batch could succeed.
    ///
    /// Bad input (invalid keys, non-finite numbers, data errors) fails the same
    /// way every time; only I/O-category serializer errors are worth a retry.
    pub fn is_transient(&self) -> bool {
        match self {
            EncodeError::Normalize { .. } => false,
            EncodeError::Json { source, .. } => source.is_io(),
        }
    }
}

/// Serializes a batch to JSON Lines: one object per record, joined by `\n`,
/// no trailing newline and no enclosing array.
#[derive(Debug, Clone)]
pub struct BatchEncoder {
    normalizer: Normalizer,
    time_key: String,
}

impl Default for BatchEncoder {
    fn default() -> Self {
        Self::new(default_time_key(), InvalidKeyPolicy::default())
    }
}

impl BatchEncoder {
    pub fn new(time_key: impl Into<String>, on_invalid_key: InvalidKeyPolicy) -> Self {
        Self {
            normalizer: Normalizer::new(on_invalid_key),
            time_key: time_key.into(),
        }
    }

    pub fn time_key(&self) -> &str {
        &self.time_key
    }

    /// Encode the whole batch. Any failing record aborts the batch; no
    /// partial output is returned.
    pub fn encode(&self, batch: &Batch) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();

        for (index, entry) in batch.entries.iter().enumerate() {
            let mut object = self
                .normalizer
                .normalize_map(&entry.record)
                .map_err(|source| EncodeError::Normalize { index, source })?;

            // Replaces a same-named field in place, otherwise appends
            object.insert(
                self.time_key.clone(),
                JsonValue::String(format_rfc3339(&entry.timestamp)),
            );

            if index > 0 {
                out.push(b'\n');
            }
            serde_json::to_writer(&mut out, &object)
                .map_err(|source| EncodeError::Json { index, source })?;
        }

        Ok(out)
    }
}
