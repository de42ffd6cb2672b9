//! Normalize provider timestamps to the single UTC reference offset.
//!
//! Offsets in RFC 3339 text are honoured as-is. Naive local text is placed in a
//! caller-chosen IANA zone first.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{EngineError, Result};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse an IANA zone name such as "America/Chicago".
///
/// # Errors
/// Returns `EngineError::InvalidTimezone` if the name is unknown.
pub fn parse_zone(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| EngineError::InvalidTimezone(name.to_string()))
}

/// Parse a timestamp into `DateTime<Utc>`.
///
/// Accepts RFC 3339 with any offset (e.g., "2026-03-01T23:59:00-06:00") and naive
/// local time (e.g., "2026-03-01T23:59:00"), which is interpreted in `zone`.
/// A local time repeated by a DST fall-back resolves to the earlier instant; a
/// local time skipped by spring-forward is rejected.
///
/// # Errors
/// Returns `EngineError::InvalidTimestamp` if the text matches no accepted form
/// or names a nonexistent local time.
pub fn parse_timestamp(text: &str, zone: Tz) -> Result<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .ok_or_else(|| {
            EngineError::InvalidTimestamp(format!("unrecognized format: '{}'", text))
        })?;

    localize(naive, zone).ok_or_else(|| {
        EngineError::InvalidTimestamp(format!("'{}' does not exist in {}", text, zone.name()))
    })
}

/// The UTC span `[start, end)` of the local calendar day `date` in `zone`.
///
/// Days containing a DST transition are 23 or 25 hours long.
///
/// # Errors
/// Returns `EngineError::InvalidTimestamp` if local midnight does not exist in
/// `zone` on either boundary day.
pub fn day_bounds(date: NaiveDate, zone: Tz) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date
        .succ_opt()
        .ok_or_else(|| EngineError::InvalidTimestamp(format!("no day after {}", date)))?;
    Ok((start_of_day(date, zone)?, start_of_day(next, zone)?))
}

fn start_of_day(date: NaiveDate, zone: Tz) -> Result<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| EngineError::InvalidTimestamp(format!("no midnight on {}", date)))?;

    // A handful of zones skip midnight itself on transition days; the day then
    // starts at the first instant that exists.
    localize(midnight, zone)
        .or_else(|| localize(midnight + Duration::hours(1), zone))
        .ok_or_else(|| {
            EngineError::InvalidTimestamp(format!("{} has no start in {}", date, zone.name()))
        })
}

fn localize(naive: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
