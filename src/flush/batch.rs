use crate::record::{RawRecord, Record};
use chrono::{DateTime, Utc};

/// The records collected during one flush call, all for a single tag.
///
/// A batch is built, encoded once and dropped; it never outlives the flush
/// that created it.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Routing tag supplied by the host for this flush
    pub tag: String,

    /// Records in arrival order
    pub entries: Vec<BatchEntry>,

    /// Set when the decoder failed before the end of the batch
    pub decode_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    /// Resolved event time
    pub timestamp: DateTime<Utc>,

    pub record: Record,
}

impl Batch {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            entries: Vec::new(),
            decode_error: None,
        }
    }

    pub fn push(&mut self, timestamp: DateTime<Utc>, record: Record) {
        self.entries.push(BatchEntry { timestamp, record });
    }

    /// Resolve the raw record's time (falling back to `now`) and append it.
    pub fn push_raw(&mut self, raw: RawRecord, now: impl FnOnce() -> DateTime<Utc>) {
        let timestamp = raw.timestamp.resolve_or(now);
        self.push(timestamp, raw.record);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TimestampSource;
    use chrono::TimeZone;

    #[test]
    fn test_push_raw_resolves_time() {
        let now = Utc.with_ymd_and_hms(2026, 1, 28, 10, 0, 0).unwrap();
        let mut batch = Batch::new("app1");

        batch.push_raw(
            RawRecord::new(TimestampSource::EpochSeconds(2000), Record::new()),
            || now,
        );
        batch.push_raw(RawRecord::new(TimestampSource::Absent, Record::new()), || now);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.entries[0].timestamp.timestamp(), 2000);
        assert_eq!(batch.entries[1].timestamp, now);
    }
}
