//! Timestamp helpers.
//!
//! Record timestamps carry millisecond precision and serialize as
//! `YYYY-MM-DDTHH:MM:SS.mmmZ`.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};

/// Current time truncated to milliseconds.
///
/// Truncating up front keeps a stored-then-reloaded stamp equal to the
/// one handed back at creation.
#[must_use]
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// The stamp for a successful update: `now`, but never earlier than one
/// millisecond past `previous`.
#[must_use]
pub fn next_update_stamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous + Duration::milliseconds(1);
    if now < floor { floor } else { now }
}

/// Format a timestamp in the wire format.
#[must_use]
pub fn format_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored or filtered timestamp.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Serde adapter for millisecond wire timestamps.
pub mod millis {
    use super::{format_millis, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_millis(dt))
    }

    /// # Errors
    ///
    /// Returns an error if the value is not an RFC3339 timestamp.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }
}
