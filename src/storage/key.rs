use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Object key for one flushed batch: `prefix/tag/YYYYMMDD/HH/<uuid>.log`.
///
/// The random v4 UUID is the only thing keeping keys unique; storage is never
/// checked for an existing object first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn generate(prefix: &str, tag: &str, at: DateTime<Utc>) -> Self {
        Self::with_id(prefix, tag, at, Uuid::new_v4())
    }

    pub fn with_id(prefix: &str, tag: &str, at: DateTime<Utc>, id: Uuid) -> Self {
        let partition = at.format("%Y%m%d/%H").to_string();
        let file_name = format!("{}.log", id.hyphenated());
        Self(join_segments([prefix, tag, &partition, &file_name]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Join path parts with `/`, dropping empty and `.` segments and letting `..`
/// remove the segment before it. The result never starts or ends with `/`.
fn join_segments<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in parts.into_iter().flat_map(|part| part.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}
