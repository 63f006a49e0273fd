// End-to-end flush tests against the in-memory and local object_store backends.
use async_trait::async_trait;
use bucketlog::config::types::{InvalidKeyPolicy, OutputConfig, StorageConfig};
use bucketlog::flush::{Clock, FlushOutcome, Flusher};
use bucketlog::host::{JsonLinesDecoder, VecDecoder};
use bucketlog::record::{RawRecord, Record, TimestampSource, Value};
use bucketlog::storage::{BucketStore, ObjectWriter, WriteError};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use object_store::path::Path;
use object_store::ObjectStore;
use regex::Regex;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Writer that always fails, counting attempts.
#[derive(Default)]
struct FailingWriter {
    attempts: AtomicUsize,
}

#[async_trait]
impl ObjectWriter for FailingWriter {
    async fn write(&self, _bucket: &str, _key: &str, _body: Bytes) -> Result<(), WriteError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(WriteError::ObjectStore(object_store::Error::Generic {
            store: "failing",
            source: "quota exceeded".into(),
        }))
    }
}

fn epoch_clock(secs: i64) -> Clock {
    Arc::new(move || Utc.timestamp_opt(secs, 0).unwrap())
}

/// Walk the bucket with delimiter listings and return every key, sorted.
async fn list_keys(store: &Arc<dyn ObjectStore>) -> Vec<String> {
    let mut keys = Vec::new();
    let mut pending: Vec<Option<Path>> = vec![None];

    while let Some(prefix) = pending.pop() {
        let listing = store.list_with_delimiter(prefix.as_ref()).await.unwrap();
        keys.extend(listing.objects.into_iter().map(|meta| meta.location.to_string()));
        pending.extend(listing.common_prefixes.into_iter().map(Some));
    }

    keys.sort();
    keys
}

#[tokio::test]
async fn test_two_record_batch_memory_store() {
    let store = Arc::new(BucketStore::new(StorageConfig::memory()));
    let flusher =
        Flusher::new(store.clone(), &OutputConfig::new("bucket", "logs")).with_clock(epoch_clock(2000));

    let input = "[1000, {\"msg\": \"a\"}]\n[2000, {\"msg\": \"b\"}]";
    let mut decoder = JsonLinesDecoder::new(Cursor::new(input.as_bytes().to_vec()));

    let outcome = flusher.flush("app1", &mut decoder).await;
    assert_eq!(outcome, FlushOutcome::Processed);

    let bucket = store.store_for("bucket").unwrap();
    let keys = list_keys(&bucket).await;
    assert_eq!(keys.len(), 1);

    let key_pattern = Regex::new(
        r"^logs/app1/19700101/00/[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}\.log$",
    )
    .unwrap();
    assert!(key_pattern.is_match(&keys[0]), "{}", keys[0]);

    let body = bucket
        .get(&Path::parse(keys[0].as_str()).unwrap())
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(
        std::str::from_utf8(&body).unwrap(),
        "{\"msg\":\"a\",\"ts\":\"1970-01-01T00:16:40Z\"}\n{\"msg\":\"b\",\"ts\":\"1970-01-01T00:33:20Z\"}"
    );
}

#[tokio::test]
async fn test_local_store_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(BucketStore::new(StorageConfig::local(temp_dir.path())));
    let flusher = Flusher::new(store.clone(), &OutputConfig::new("archive", ""));

    let nested: Record = [("pod", Value::from(b"web-0".to_vec()))].into_iter().collect();
    let record: Record = [
        ("log", Value::from(b"GET /index.html 200".to_vec())),
        ("kubernetes", Value::Map(nested)),
    ]
    .into_iter()
    .collect();
    let mut decoder = VecDecoder::new(vec![RawRecord::new(TimestampSource::EpochSeconds(0), record)]);

    let report = flusher
        .try_flush(flusher.defaults(), "kube.web", &mut decoder)
        .await
        .unwrap();

    assert!(report.key.as_str().starts_with("kube.web/"));
    let on_disk = temp_dir.path().join("archive").join(report.key.as_str());
    let body = std::fs::read_to_string(on_disk).unwrap();
    assert_eq!(
        body,
        r#"{"log":"GET /index.html 200","kubernetes":{"pod":"web-0"},"ts":"1970-01-01T00:00:00Z"}"#
    );
}

#[tokio::test]
async fn test_write_failure_is_retry_and_attempted_once() {
    let writer = Arc::new(FailingWriter::default());
    let flusher = Flusher::new(writer.clone(), &OutputConfig::new("bucket", "logs"));
    let mut decoder = VecDecoder::new(vec![RawRecord::new(
        TimestampSource::Absent,
        [("msg", "a")].into_iter().collect(),
    )]);

    let outcome = flusher.flush("app1", &mut decoder).await;

    assert_eq!(outcome, FlushOutcome::Retry);
    assert_eq!(outcome.code(), 2);
    assert_eq!(writer.attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_key_leaves_no_object() {
    let store = Arc::new(BucketStore::new(StorageConfig::memory()));
    let flusher = Flusher::new(store.clone(), &OutputConfig::new("bucket", "logs"));
    let mut bad = Record::new();
    bad.insert(Value::Int(3), "three");
    let mut decoder = VecDecoder::new(vec![RawRecord::new(TimestampSource::Absent, bad)]);

    let outcome = flusher.flush("app1", &mut decoder).await;

    assert_eq!(outcome, FlushOutcome::Error);
    let bucket = store.store_for("bucket").unwrap();
    assert!(list_keys(&bucket).await.is_empty());
}

#[tokio::test]
async fn test_skip_policy_drops_field_and_writes() {
    let store = Arc::new(BucketStore::new(StorageConfig::memory()));
    let mut output = OutputConfig::new("bucket", "logs");
    output.on_invalid_key = InvalidKeyPolicy::Skip;
    let flusher = Flusher::new(store.clone(), &output);

    let mut record = Record::new();
    record.insert("msg", "kept");
    record.insert(Value::Int(3), "dropped");
    let mut decoder =
        VecDecoder::new(vec![RawRecord::new(TimestampSource::EpochSeconds(0), record)]);

    let report = flusher
        .try_flush(flusher.defaults(), "app1", &mut decoder)
        .await
        .unwrap();

    let body = store
        .store_for("bucket")
        .unwrap()
        .get(&Path::parse(report.key.as_str()).unwrap())
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(&body[..], br#"{"msg":"kept","ts":"1970-01-01T00:00:00Z"}"#);
}

#[tokio::test]
async fn test_stored_key_matches_reported_key() {
    let store = Arc::new(BucketStore::new(StorageConfig::memory()));
    let flusher = Flusher::new(store.clone(), &OutputConfig::new("bucket", "logs"));
    let mut decoder = VecDecoder::new(vec![RawRecord::new(
        TimestampSource::EpochSeconds(0),
        [("msg", "a")].into_iter().collect(),
    )]);

    let report = flusher
        .try_flush(flusher.defaults(), "app[1]", &mut decoder)
        .await
        .unwrap();

    assert!(report.key.as_str().starts_with("logs/app[1]/"));
    let keys = list_keys(&store.store_for("bucket").unwrap()).await;
    assert_eq!(keys, vec![report.key.to_string()]);
}

#[tokio::test]
async fn test_decode_error_flushes_prefix() {
    let store = Arc::new(BucketStore::new(StorageConfig::memory()));
    let flusher = Flusher::new(store.clone(), &OutputConfig::new("bucket", ""));
    let input = "[1, {\"n\": 1}]\n{broken\n[3, {\"n\": 3}]";
    let mut decoder = JsonLinesDecoder::new(Cursor::new(input.as_bytes().to_vec()));

    let report = flusher
        .try_flush(flusher.defaults(), "app1", &mut decoder)
        .await
        .unwrap();

    assert_eq!(report.records, 1);
    assert!(report.decode_error.is_some());
}

#[tokio::test]
async fn test_concurrent_flushes_are_independent() {
    let store = Arc::new(BucketStore::new(StorageConfig::memory()));
    let flusher = Arc::new(Flusher::new(store.clone(), &OutputConfig::new("bucket", "logs")));

    let mut handles = Vec::new();
    for i in 0..8u64 {
        let flusher = flusher.clone();
        handles.push(tokio::spawn(async move {
            let records = (0..10)
                .map(|n| {
                    RawRecord::new(
                        TimestampSource::EpochSeconds(i * 100 + n),
                        [("n", Value::UInt(n))].into_iter().collect(),
                    )
                })
                .collect();
            let mut decoder = VecDecoder::new(records);
            flusher.flush(&format!("tag{}", i), &mut decoder).await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), FlushOutcome::Processed);
    }

    let keys = list_keys(&store.store_for("bucket").unwrap()).await;
    assert_eq!(keys.len(), 8);
    for i in 0..8 {
        assert!(keys.iter().any(|k| k.starts_with(&format!("logs/tag{}/", i))));
    }
}
