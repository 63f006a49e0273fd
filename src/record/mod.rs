pub mod timestamp;
pub mod value;

pub use timestamp::{format_rfc3339, TimestampSource};
pub use value::{Record, Value};

/// One record as handed over by the host decoder, with its time not yet resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub timestamp: TimestampSource,
    pub record: Record,
}

impl RawRecord {
    pub fn new(timestamp: TimestampSource, record: Record) -> Self {
        Self { timestamp, record }
    }
}
