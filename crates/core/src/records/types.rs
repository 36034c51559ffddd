//! Strong types for record timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use tickerwire_market_data::FILE_TIMESTAMP_FORMAT;

/// Canonical text form: `2024-01-02T03:04:05Z`.
pub const FETCH_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// =============================================================================
// FetchTimestamp
// =============================================================================

/// The single instant a run fetched its data, truncated to whole seconds.
///
/// Every record of a run carries the same value; together with the record's own key
/// it forms the natural key in storage. It is stored and compared in its canonical
/// text form, which sorts chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchTimestamp(DateTime<Utc>);

impl FetchTimestamp {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(0))
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Suffix used in artifact file names (`20240102_030405`).
    pub fn file_stamp(&self) -> String {
        self.0.format(FILE_TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for FetchTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FETCH_TIMESTAMP_FORMAT))
    }
}

impl From<DateTime<Utc>> for FetchTimestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::new(at)
    }
}

impl FromStr for FetchTimestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match NaiveDateTime::parse_from_str(s, FETCH_TIMESTAMP_FORMAT) {
            Ok(naive) => Ok(Self::new(naive.and_utc())),
            Err(_) => DateTime::parse_from_rfc3339(s).map(|dt| Self::new(dt.with_timezone(&Utc))),
        }
    }
}

impl Serialize for FetchTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FetchTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_display_is_canonical_iso() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let ts = FetchTimestamp::new(at + chrono::Duration::milliseconds(750));
        assert_eq!(ts.to_string(), "2024-01-02T03:04:05Z");
        assert_eq!(ts.file_stamp(), "20240102_030405");
    }

    #[test]
    fn test_parse_roundtrips_and_accepts_offsets() {
        let ts: FetchTimestamp = "2024-01-02T03:04:05Z".parse().unwrap();
        assert_eq!(ts.to_string(), "2024-01-02T03:04:05Z");

        let shifted: FetchTimestamp = "2024-01-02T05:04:05+02:00".parse().unwrap();
        assert_eq!(shifted, ts);
    }

    #[test]
    fn test_text_order_matches_time_order() {
        let early = FetchTimestamp::new(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());
        let late = FetchTimestamp::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(early < late);
        assert!(early.to_string() < late.to_string());
    }
}
