use crate::record::{RawRecord, Record, TimestampSource, Value};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;
use std::io::BufRead;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {message}")]
    Shape { line: usize, message: String },
}

/// Pull-based access to one flush's worth of records.
///
/// `Ok(None)` signals the end of the batch.
pub trait RecordDecoder: Send {
    fn next_record(&mut self) -> Result<Option<RawRecord>, DecodeError>;
}

/// Decoder over records that are already in memory.
#[derive(Debug)]
pub struct VecDecoder {
    records: std::vec::IntoIter<RawRecord>,
}

impl VecDecoder {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl RecordDecoder for VecDecoder {
    fn next_record(&mut self) -> Result<Option<RawRecord>, DecodeError> {
        Ok(self.records.next())
    }
}

/// Decodes JSON Lines where every line is `[time, record]`.
///
/// `time` may be an unsigned integer (epoch seconds), a float (epoch seconds
/// with fraction), an RFC 3339 string, `null`, or `[time, metadata]` as newer
/// forwarders emit. Anything else is kept as unrecognized and resolved to the
/// current time later. Blank lines are skipped.
pub struct JsonLinesDecoder<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead + Send> JsonLinesDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    fn decode_line(&self, text: &str) -> Result<RawRecord, DecodeError> {
        let json: JsonValue = serde_json::from_str(text).map_err(|source| DecodeError::Json {
            line: self.line,
            source,
        })?;

        let JsonValue::Array(mut parts) = json else {
            return Err(self.shape_error("expected a [time, record] array"));
        };
        if parts.len() != 2 {
            return Err(self.shape_error(&format!(
                "expected 2 elements, found {}",
                parts.len()
            )));
        }

        let record_json = parts.pop().unwrap_or(JsonValue::Null);
        let time_json = parts.pop().unwrap_or(JsonValue::Null);

        let JsonValue::Object(fields) = record_json else {
            return Err(self.shape_error("record must be a JSON object"));
        };

        let record: Record = fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect();

        Ok(RawRecord::new(timestamp_source(&time_json), record))
    }

    fn shape_error(&self, message: &str) -> DecodeError {
        DecodeError::Shape {
            line: self.line,
            message: message.to_string(),
        }
    }
}

impl<R: BufRead + Send> RecordDecoder for JsonLinesDecoder<R> {
    fn next_record(&mut self) -> Result<Option<RawRecord>, DecodeError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            let raw = self.decode_line(text)?;
            debug!(line = self.line, fields = raw.record.len(), "Decoded record");
            return Ok(Some(raw));
        }
    }
}

fn timestamp_source(json: &JsonValue) -> TimestampSource {
    match json {
        JsonValue::Null => TimestampSource::Absent,
        JsonValue::Number(n) => {
            if let Some(secs) = n.as_u64() {
                TimestampSource::EpochSeconds(secs)
            } else if let Some(t) = n.as_f64().filter(|_| n.is_f64()).and_then(float_epoch) {
                TimestampSource::Structured(t)
            } else {
                TimestampSource::Unrecognized(n.to_string())
            }
        }
        JsonValue::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(t) => TimestampSource::Structured(t.with_timezone(&Utc)),
            Err(_) => TimestampSource::Unrecognized(s.clone()),
        },
        // [time, metadata]
        JsonValue::Array(items) if items.len() == 2 && !items[0].is_array() => {
            timestamp_source(&items[0])
        }
        other => TimestampSource::Unrecognized(other.to_string()),
    }
}

fn float_epoch(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 || secs > i64::MAX as f64 {
        return None;
    }
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    Utc.timestamp_opt(whole as i64, nanos).single()
}
