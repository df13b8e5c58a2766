//! ISO-8601 date formatting
//!
//! The analytics API wants UTC timestamps in ISO 8601:2004 basic-offset form,
//! e.g. `2013-07-01T09:30:00+0000`. Store data arrives in several shapes;
//! naive values are stored in UTC by the host platform and are read as UTC.

use crate::domain::{FormattingError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Output format for API timestamps
pub const API_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a calendar date/time and renders it as an API timestamp
///
/// # Errors
///
/// Returns [`FormattingError::InvalidDate`] when the input is not a
/// recognised date/time.
///
/// # Examples
///
/// ```
/// use storefeed::core::format::format_date;
///
/// assert_eq!(
///     format_date("2013-07-01 09:30:00").unwrap(),
///     "2013-07-01T09:30:00+0000"
/// );
/// assert_eq!(
///     format_date("2013-07-01T11:30:00+02:00").unwrap(),
///     "2013-07-01T09:30:00+0000"
/// );
/// assert!(format_date("next tuesday").is_err());
/// ```
pub fn format_date(input: &str) -> Result<String> {
    let parsed = parse_date(input)?;
    Ok(format_datetime(&parsed))
}

/// Renders a UTC timestamp in API form
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format(API_DATE_FORMAT).to_string()
}

/// Parses a calendar date/time into UTC
pub fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FormattingError::InvalidDate(input.to_string()).into());
    }

    if let Some(parsed) = parse_compact(trimmed) {
        return Ok(parsed);
    }

    if let Some(parsed) = parse_unix_timestamp(trimmed) {
        return Ok(parsed);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Utc.from_utc_datetime(&parsed));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }

    Err(FormattingError::InvalidDate(input.to_string()).into())
}

/// `YYYYMMDD` or `YYYYMMDDHHMMSS`, checked before the epoch reading of
/// all-digit input
fn parse_compact(input: &str) -> Option<DateTime<Utc>> {
    if !matches!(input.len(), 8 | 14) || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let part = |range: std::ops::Range<usize>| input[range].parse::<u32>().ok();

    let year = i32::try_from(part(0..4)?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, part(4..6)?, part(6..8)?)?;
    let time = if input.len() == 14 {
        date.and_hms_opt(part(8..10)?, part(10..12)?, part(12..14)?)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(Utc.from_utc_datetime(&time))
}

fn parse_unix_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let digits = input.strip_prefix('-').unwrap_or(input);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let seconds = input.parse::<i64>().ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}
