// ABOUTME: Identifier and clock service for records: opaque ULID ids and creation timestamps.
// ABOUTME: Generated timestamps never move backwards in-process; supplied ones keep their text.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use ulid::Ulid;

/// Highest instant handed out by `now()`, in microseconds since the epoch.
static LAST_ISSUED_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Generate a fresh record identifier. ULIDs render as fixed-length
/// 26-character strings and are unique with overwhelming probability.
pub fn new_id() -> String {
    Ulid::new().to_string()
}

/// Current instant at microsecond precision, clamped so that successive
/// calls are non-decreasing.
pub fn now() -> Timestamp {
    let wall_micros = Utc::now().timestamp_micros();
    let previous = LAST_ISSUED_MICROS.fetch_max(wall_micros, Ordering::SeqCst);
    let issued = previous.max(wall_micros);
    // Clock values are always in chrono's representable range.
    Timestamp::from_datetime(DateTime::from_timestamp_micros(issued).unwrap_or_default())
}

/// A timestamp field value: the text as stored plus the UTC instant it
/// denotes.
///
/// Generated timestamps render as `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
/// Timestamps read from callers or snapshots keep their text verbatim, so
/// a value written as `2026-03-01T15:00:00Z` is stored, returned and
/// matched as exactly that string. Equality is textual; ordering is by
/// instant, then text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timestamp {
    text: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Render an instant, truncated to microsecond precision.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let instant = DateTime::from_timestamp_micros(at.timestamp_micros()).unwrap_or(at);
        Self {
            text: instant.to_rfc3339_opts(SecondsFormat::Micros, true),
            instant,
        }
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Shift by a signed duration, e.g. "26 hours ago" for seed data.
    pub fn offset(&self, by: Duration) -> Self {
        Self::from_datetime(self.instant + by)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.instant
            .cmp(&other.instant)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Returned for text that names no instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a timestamp: {0:?}")]
pub struct ParseTimestampError(pub String);

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    /// Accepts RFC 3339 instants, zone-less date-times (read as UTC), and
    /// bare dates (midnight UTC). The text is kept as given.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let instant = parse_instant(s.trim()).ok_or_else(|| ParseTimestampError(s.to_string()))?;
        Ok(Self {
            text: s.to_string(),
            instant,
        })
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
