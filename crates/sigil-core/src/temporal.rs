//! # Temporal Types — UTC Timestamps with a Fixed Wire Form
//!
//! `Timestamp` always serializes as `YYYY-MM-DDTHH:MM:SS.sssZ`: UTC, `Z`
//! suffix, exactly three fractional digits. This is the date form the
//! canonicalizer sees, so the same instant always hashes the same way.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SigilError;

/// A UTC timestamp truncated to millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// Wrap a `DateTime<Utc>`, dropping sub-millisecond precision.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::from_epoch_millis(dt.timestamp_millis()).unwrap_or(Self(dt))
    }

    /// Build from Unix epoch milliseconds.
    pub fn from_epoch_millis(ms: i64) -> Result<Self, SigilError> {
        Utc.timestamp_millis_opt(ms)
            .single()
            .map(Self)
            .ok_or_else(|| SigilError::Payload(format!("invalid epoch milliseconds: {ms}")))
    }

    /// Build from Unix epoch milliseconds, clamping into the representable
    /// range instead of failing.
    pub fn from_epoch_millis_saturating(ms: i64) -> Self {
        let lo = DateTime::<Utc>::MIN_UTC.timestamp_millis();
        let hi = DateTime::<Utc>::MAX_UTC.timestamp_millis();
        match Utc.timestamp_millis_opt(ms.clamp(lo, hi)).single() {
            Some(dt) => Self(dt),
            None if ms < 0 => Self(DateTime::<Utc>::MIN_UTC),
            None => Self(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Parse an RFC 3339 string with any offset, normalizing to UTC.
    pub fn parse(s: &str) -> Result<Self, SigilError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| SigilError::Payload(format!("invalid RFC 3339 timestamp {s:?}: {e}")))?;
        Ok(Self::from_utc(dt.with_timezone(&Utc)))
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The canonical wire form, e.g. `2024-05-10T06:45:41.888Z`.
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
