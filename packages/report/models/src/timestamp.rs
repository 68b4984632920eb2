//! Wire encodings of `createdAt`.
//!
//! Reports arrive with epoch milliseconds, ISO-8601 strings (the v1 local
//! schema), or a database-native `{seconds, nanoseconds}` object. All three
//! are reduced to a `DateTime<Utc>` by [`Timestamp::to_datetime`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A `createdAt` value as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// Fractional milliseconds since the Unix epoch.
    FractionalMillis(f64),
    /// Database-native timestamp object.
    Database {
        /// Whole seconds since the Unix epoch.
        #[serde(alias = "_seconds")]
        seconds: i64,
        /// Sub-second nanoseconds.
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    /// Date string (RFC 3339, a bare `YYYY-MM-DD` date read as UTC
    /// midnight, or any numeric string of epoch millis).
    Text(String),
}

impl Timestamp {
    /// Normalizes to a UTC date. Returns `None` when the value cannot be
    /// interpreted.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
            Self::FractionalMillis(ms) => millis_to_datetime(*ms),
            Self::Database {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds),
            Self::Text(s) => {
                let s = s.trim();
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .ok()
                    .or_else(|| {
                        NaiveDate::parse_from_str(s, "%Y-%m-%d")
                            .ok()
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                            .map(|dt| dt.and_utc())
                    })
                    .or_else(|| s.parse::<f64>().ok().and_then(millis_to_datetime))
            }
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::EpochMillis(dt.timestamp_millis())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn millis_to_datetime(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_encodings_normalize_to_same_instant() {
        let expected = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let millis: Timestamp = serde_json::from_str("1700000000000").unwrap();
        let db: Timestamp =
            serde_json::from_str(r#"{"seconds":1700000000,"nanoseconds":0}"#).unwrap();
        let underscored: Timestamp = serde_json::from_str(r#"{"_seconds":1700000000}"#).unwrap();
        let iso: Timestamp = serde_json::from_str(r#""2023-11-14T22:13:20.000Z""#).unwrap();

        assert_eq!(millis.to_datetime(), Some(expected));
        assert_eq!(db.to_datetime(), Some(expected));
        assert_eq!(underscored.to_datetime(), Some(expected));
        assert_eq!(iso.to_datetime(), Some(expected));
    }

    #[test]
    fn fractional_millis_are_rounded() {
        let ts: Timestamp = serde_json::from_str("1700000000000.4").unwrap();
        assert_eq!(
            ts.to_datetime(),
            DateTime::from_timestamp_millis(1_700_000_000_000)
        );
    }

    #[test]
    fn date_only_text_is_utc_midnight() {
        let ts: Timestamp = serde_json::from_str(r#""2024-01-05""#).unwrap();
        assert_eq!(
            ts.to_datetime(),
            DateTime::parse_from_rfc3339("2024-01-05T00:00:00Z")
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        );
        assert_eq!(Timestamp::Text("2024-13-40".to_string()).to_datetime(), None);
    }

    #[test]
    fn garbage_text_is_unparseable() {
        let ts = Timestamp::Text("yesterday-ish".to_string());
        assert_eq!(ts.to_datetime(), None);
    }

    #[test]
    fn datetime_serializes_as_millis() {
        let dt = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let ts = Timestamp::from(dt);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "1700000000123");
        assert_eq!(ts.to_datetime(), Some(dt));
    }
}
