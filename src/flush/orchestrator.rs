use super::batch::Batch;
use super::outcome::{FlushError, FlushOutcome};
use crate::config::types::OutputConfig;
use crate::encode::BatchEncoder;
use crate::host::decoder::RecordDecoder;
use crate::storage::{ObjectKey, ObjectWriter};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Source of wall-clock time for timestamp fallback and key partitioning.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Bucket and prefix a batch is written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    pub bucket: String,
    pub prefix: String,
}

/// Summary of a successful flush.
#[derive(Debug, Clone)]
pub struct FlushReport {
    pub key: ObjectKey,
    pub records: usize,
    pub bytes: usize,
    /// Why collection stopped early, if it did. Records after that point
    /// were not part of the batch.
    pub decode_error: Option<String>,
}

/// Drives one flush: collect → encode → derive key → write.
///
/// Holds only read-only settings and the shared writer, so a single
/// `Flusher` can serve concurrent flush calls. Nothing is retried here;
/// a failed write is reported back as [`FlushOutcome::Retry`] and the host
/// redelivers the batch.
pub struct Flusher {
    writer: Arc<dyn ObjectWriter>,
    encoder: BatchEncoder,
    defaults: Routing,
    clock: Clock,
}

impl Flusher {
    pub fn new(writer: Arc<dyn ObjectWriter>, output: &OutputConfig) -> Self {
        Self {
            writer,
            encoder: BatchEncoder::new(output.time_key.clone(), output.on_invalid_key),
            defaults: Routing {
                bucket: output.bucket.clone(),
                prefix: output.prefix.clone(),
            },
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, e.g. to pin key partitions in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn defaults(&self) -> &Routing {
        &self.defaults
    }

    /// Flush one batch to the configured bucket and prefix.
    pub async fn flush(&self, tag: &str, decoder: &mut dyn RecordDecoder) -> FlushOutcome {
        let routing = self.defaults.clone();
        self.flush_routed(&routing, tag, decoder).await
    }

    /// Flush one batch to an explicit bucket and prefix.
    pub async fn flush_routed(
        &self,
        routing: &Routing,
        tag: &str,
        decoder: &mut dyn RecordDecoder,
    ) -> FlushOutcome {
        info!(
            bucket = %routing.bucket,
            prefix = %routing.prefix,
            tag = %tag,
            "Flush called"
        );

        let batch = self.collect(tag, decoder);

        match self.write_batch(routing, &batch).await {
            Ok(_) => FlushOutcome::Processed,
            Err(e) => {
                let outcome = e.outcome();
                warn!(
                    tag = %tag,
                    bucket = %routing.bucket,
                    records = batch.len(),
                    outcome = %outcome,
                    error = %e,
                    "Error sending batch to object storage"
                );
                outcome
            }
        }
    }

    /// Pull records until the decoder reports the end of the batch.
    ///
    /// A decode error also ends collection; whatever was decoded before it is
    /// still flushed.
    pub fn collect(&self, tag: &str, decoder: &mut dyn RecordDecoder) -> Batch {
        let mut batch = Batch::new(tag);

        loop {
            match decoder.next_record() {
                Ok(Some(raw)) => batch.push_raw(raw, || (self.clock)()),
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        tag = %tag,
                        decoded = batch.len(),
                        error = %e,
                        "Decoder failed, flushing records decoded so far"
                    );
                    batch.decode_error = Some(e.to_string());
                    break;
                }
            }
        }

        batch
    }

    /// Encode and write an already collected batch. Exactly one write is
    /// attempted, and only after the whole batch encoded successfully.
    pub async fn write_batch(
        &self,
        routing: &Routing,
        batch: &Batch,
    ) -> Result<FlushReport, FlushError> {
        let body = self.encoder.encode(batch)?;
        let key = ObjectKey::generate(&routing.prefix, &batch.tag, (self.clock)());
        let bytes = body.len();

        self.writer
            .write(&routing.bucket, key.as_str(), Bytes::from(body))
            .await
            .map_err(|source| FlushError::Write {
                key: key.to_string(),
                source,
            })?;

        info!(
            bucket = %routing.bucket,
            key = %key,
            records = batch.len(),
            bytes,
            "Batch written"
        );

        Ok(FlushReport {
            key,
            records: batch.len(),
            bytes,
            decode_error: batch.decode_error.clone(),
        })
    }

    /// Collect and write, returning the report or the error instead of a
    /// bare outcome.
    pub async fn try_flush(
        &self,
        routing: &Routing,
        tag: &str,
        decoder: &mut dyn RecordDecoder,
    ) -> Result<FlushReport, FlushError> {
        let batch = self.collect(tag, decoder);
        self.write_batch(routing, &batch).await
    }
}
