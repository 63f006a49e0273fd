use crate::config::types::InvalidKeyPolicy;
use crate::record::{format_rfc3339, Record, Value};
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("record key must be a string, found {found}")]
    InvalidKeyType { found: &'static str },

    #[error("field '{field}' holds a non-finite number")]
    NonFiniteNumber { field: String },
}

/// Turns a [`Record`] into a JSON object.
///
/// Binary values become their text form (invalid UTF-8 is replaced, never
/// base64-encoded). Maps and arrays are normalized at every depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    on_invalid_key: InvalidKeyPolicy,
}

impl Normalizer {
    pub fn new(on_invalid_key: InvalidKeyPolicy) -> Self {
        Self { on_invalid_key }
    }

    pub fn normalize(&self, record: &Record) -> Result<JsonValue, NormalizeError> {
        self.normalize_map(record).map(JsonValue::Object)
    }

    /// Like [`Normalizer::normalize`] but returns the object map directly.
    pub fn normalize_map(&self, record: &Record) -> Result<Map<String, JsonValue>, NormalizeError> {
        let mut out = Map::new();

        for (key, value) in record.iter() {
            let key = match key_to_string(key) {
                Ok(key) => key,
                Err(e) => match self.on_invalid_key {
                    InvalidKeyPolicy::Fail => return Err(e),
                    InvalidKeyPolicy::Skip => {
                        warn!(error = %e, "Dropping record field with invalid key");
                        continue;
                    }
                },
            };

            let value = self.normalize_value(value, &key)?;
            if out.insert(key.clone(), value).is_some() {
                warn!(field = %key, "Two record keys normalize to the same name, keeping the later value");
            }
        }

        Ok(out)
    }

    fn normalize_value(&self, value: &Value, field: &str) -> Result<JsonValue, NormalizeError> {
        let json = match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(n) => JsonValue::Number((*n).into()),
            Value::UInt(n) => JsonValue::Number((*n).into()),
            Value::Float(n) => Number::from_f64(*n)
                .map(JsonValue::Number)
                .ok_or_else(|| NormalizeError::NonFiniteNumber {
                    field: field.to_string(),
                })?,
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Binary(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
            Value::Time(t) => JsonValue::String(format_rfc3339(t)),
            Value::Array(items) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| self.normalize_value(item, field))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Map(record) => JsonValue::Object(self.normalize_map(record)?),
        };

        Ok(json)
    }
}

/// String keys pass through; binary keys are accepted when they are valid UTF-8.
fn key_to_string(key: &Value) -> Result<String, NormalizeError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Binary(bytes) => String::from_utf8(bytes.clone())
            .map_err(|_| NormalizeError::InvalidKeyType { found: "binary" }),
        other => Err(NormalizeError::InvalidKeyType {
            found: other.kind(),
        }),
    }
}

/// Normalize with the default policy (invalid keys fail).
pub fn normalize(record: &Record) -> Result<JsonValue, NormalizeError> {
    Normalizer::default().normalize(record)
}
