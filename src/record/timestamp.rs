use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use tracing::warn;

/// Event time as the host pipeline delivered it, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampSource {
    /// A full time value with sub-second precision.
    Structured(DateTime<Utc>),
    /// Whole seconds since the Unix epoch.
    EpochSeconds(u64),
    /// Something was delivered but it is not a known time form.
    Unrecognized(String),
    Absent,
}

impl TimestampSource {
    /// Resolve to a concrete time using the wall clock as the fallback.
    pub fn resolve(&self) -> DateTime<Utc> {
        self.resolve_or(Utc::now)
    }

    /// Resolve to a concrete time.
    ///
    /// Priority is structured time, then integer epoch, then `now()`.
    /// The fallback path is logged but is never an error.
    pub fn resolve_or(&self, now: impl FnOnce() -> DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimestampSource::Structured(t) => *t,
            TimestampSource::EpochSeconds(secs) => match epoch_seconds(*secs) {
                Some(t) => t,
                None => {
                    warn!(
                        epoch = *secs,
                        "Epoch timestamp out of range, using current time"
                    );
                    now()
                }
            },
            TimestampSource::Unrecognized(raw) => {
                warn!(value = %raw, "Timestamp isn't a known format, using current time");
                now()
            }
            TimestampSource::Absent => {
                warn!("Record has no timestamp, using current time");
                now()
            }
        }
    }
}

fn epoch_seconds(secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Render a time the way it appears in the encoded output: RFC 3339 in UTC
/// with a `Z` suffix and only as many fractional digits as needed.
pub fn format_rfc3339(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_structured_wins() {
        let t = Utc.with_ymd_and_hms(2025, 12, 4, 2, 42, 11).unwrap();
        let resolved = TimestampSource::Structured(t).resolve_or(fixed_now);
        assert_eq!(resolved, t);
    }

    #[test]
    fn test_epoch_seconds() {
        let resolved = TimestampSource::EpochSeconds(1733280131).resolve_or(fixed_now);
        assert_eq!(resolved.timestamp(), 1733280131);
        assert_eq!(resolved.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_epoch_out_of_range_falls_back() {
        let resolved = TimestampSource::EpochSeconds(u64::MAX).resolve_or(fixed_now);
        assert_eq!(resolved, fixed_now());
    }

    #[test]
    fn test_unrecognized_falls_back() {
        let resolved =
            TimestampSource::Unrecognized("yesterday".to_string()).resolve_or(fixed_now);
        assert_eq!(resolved, fixed_now());
    }

    #[test]
    fn test_absent_uses_wall_clock() {
        let before = Utc::now();
        let resolved = TimestampSource::Absent.resolve();
        let after = Utc::now();

        assert!(resolved >= before && resolved <= after);
    }

    #[test]
    fn test_format_whole_seconds() {
        let t = Utc.timestamp_opt(1000, 0).unwrap();
        assert_eq!(format_rfc3339(&t), "1970-01-01T00:16:40Z");
    }

    #[test]
    fn test_format_keeps_sub_second_precision() {
        let t = Utc.timestamp_opt(1000, 250_000_000).unwrap();
        assert_eq!(format_rfc3339(&t), "1970-01-01T00:16:40.250Z");
    }
}
