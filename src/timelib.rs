//! Parsing for every timestamp format the seriesly store accepts.
//!
//! Supported inputs:
//!
//! * `2012-08-28T21:24:35.37465188Z` - canonical form, RFC3339 in UTC
//! * `1346189075374651880` - nanoseconds since the epoch
//! * `1346189075374` - milliseconds since the epoch
//! * `1346189075` - seconds since the epoch
//! * `2012-08-28T21:24:35+02:00` - RFC3339
//! * `Tue, 28 Aug 2012 21:24:35 +0000` - RFC1123 with numeric zone
//! * `Tue, 28 Aug 2012 21:24:35 UTC` - RFC1123
//! * `Tue Aug 28 21:24:35 UTC 2012` - Unix date
//! * `Tue Aug 28 21:24:35 2012` - ANSI C
//! * `Tue Aug 28 21:24:35 +0000 2012` - Ruby date
//! * `2012-08-28T21:24`, `2012-08-28T21`, `2012-08-28`, `2012-08`, `2012`

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::{Result, SerieslyError};

const I32_MAX: i64 = i32::MAX as i64;

pub fn parse_time(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(n) = input.parse::<i64>() {
        if n > I32_MAX * 1000 {
            return Ok(Utc.timestamp_nanos(n));
        } else if n > I32_MAX {
            if let Some(t) = Utc.timestamp_millis_opt(n).single() {
                return Ok(t);
            }
        } else if n > 10_000 {
            if let Some(t) = Utc.timestamp_opt(n, 0).single() {
                return Ok(t);
            }
        }
    }

    if let Ok(t) = parse_canonical_time(input) {
        return Ok(t);
    }

    parse_rfc3339(input)
        .or_else(|| parse_rfc1123(input))
        .or_else(|| parse_unix_date(input))
        .or_else(|| parse_ansic(input))
        .or_else(|| parse_ruby_date(input))
        .or_else(|| parse_truncated(input))
        .ok_or_else(|| SerieslyError::Timestamp(input.to_string()))
}

/// Fast path for `YYYY-MM-DDTHH:MM:SS[.fraction]Z`.
pub fn parse_canonical_time(input: &str) -> Result<DateTime<Utc>> {
    let bytes = input.as_bytes();
    if bytes.len() < 20 || bytes[bytes.len() - 1] != b'Z' {
        return Err(SerieslyError::Timestamp(input.to_string()));
    }

    // 2012-08-28T21:24:35.37465188Z
    //     4  7  10 13 16 19
    if !(bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes[10] == b'T'
        && bytes[13] == b':'
        && bytes[16] == b':'
        && (bytes[19] == b'.' || bytes[19] == b'Z'))
    {
        return Err(SerieslyError::Timestamp(format!(
            "positionally incorrect: {}",
            input
        )));
    }

    let field = |range: std::ops::Range<usize>, name: &str| -> Result<u32> {
        input
            .get(range)
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| SerieslyError::Timestamp(format!("bad {} in {}", name, input)))
    };

    let year = field(0..4, "year")? as i32;
    let month = field(5..7, "month")?;
    let day = field(8..10, "day")?;
    let hour = field(11..13, "hour")?;
    let minute = field(14..16, "minute")?;
    let second = field(17..19, "second")?;

    let mut nanos = 0;
    if bytes[19] == b'.' {
        let fraction = &input[20..input.len() - 1];
        if fraction.len() > 9 {
            return Err(SerieslyError::Timestamp(format!(
                "too many fractional digits in {}",
                input
            )));
        }
        if !fraction.is_empty() {
            nanos = field(20..input.len() - 1, "nanoseconds")?
                * 10u32.pow(9 - fraction.len() as u32);
        }
    }

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_nano_opt(hour, minute, second, nanos))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| SerieslyError::Timestamp(format!("out of range: {}", input)))
}

fn parse_rfc3339(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

// Alphabetic zone names are read as UTC.
fn split_zone_name(input: &str) -> Option<(&str, &str)> {
    let (head, zone) = input.rsplit_once(' ')?;
    if !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphabetic()) {
        Some((head, zone))
    } else {
        None
    }
}

fn parse_rfc1123(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_str(input, "%a, %d %b %Y %H:%M:%S %z") {
        return Some(t.with_timezone(&Utc));
    }
    let (head, _) = split_zone_name(input)?;
    NaiveDateTime::parse_from_str(head, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_unix_date(input: &str) -> Option<DateTime<Utc>> {
    let (head, year) = input.rsplit_once(' ')?;
    let (head, _) = split_zone_name(head)?;
    NaiveDateTime::parse_from_str(&format!("{} {}", head, year), "%a %b %e %H:%M:%S %Y")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_ansic(input: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(input, "%a %b %e %H:%M:%S %Y")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_ruby_date(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(input, "%a %b %d %H:%M:%S %z %Y")
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_truncated(input: &str) -> Option<DateTime<Utc>> {
    let naive = match input.len() {
        16 => NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M").ok(),
        13 => NaiveDateTime::parse_from_str(&format!("{}:00", input), "%Y-%m-%dT%H:%M").ok(),
        10 => NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        7 => NaiveDate::parse_from_str(&format!("{}-01", input), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        4 => NaiveDate::parse_from_str(&format!("{}-01-01", input), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        _ => None,
    }?;
    Some(Utc.from_utc_datetime(&naive))
}
