//! Serde helpers for request payloads.
//!
//! Clients often send `""` for a cleared optional field. These helpers read
//! blank strings as `None`.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

/// Optional string, blank reads as `None`.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)
}

/// Optional `YYYY-MM-DD` date.
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)?
        .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(serde::de::Error::custom))
        .transpose()
}

/// Optional time, `HH:MM` or `HH:MM:SS`.
pub fn deserialize_optional_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)?
        .map(|s| {
            let s = s.trim();
            NaiveTime::parse_from_str(s, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
}

/// Optional RFC 3339 timestamp. A bare `YYYY-MM-DD` reads as midnight UTC.
pub fn deserialize_optional_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)?
        .map(|s| {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
                })
                .map_err(serde::de::Error::custom)
        })
        .transpose()
}

/// Reference that a partial update may clear.
///
/// Use with `#[serde(default)]`: an absent field stays `None`, while `null`
/// or `""` becomes `Some(None)`.
pub fn deserialize_nullable_uuid<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)?
        .map(|s| Uuid::parse_str(s.trim()).map_err(serde::de::Error::custom))
        .transpose()
        .map(Some)
}
