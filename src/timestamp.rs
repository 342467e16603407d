//! AERMOD date-hour codes and their calendar normalization.
//!
//! PST and SFC records carry hours in the AERMOD convention `01..=24`, where
//! hour `24` is the last hour of a day. Decoding keeps that convention in the
//! timestamp string; [`normalize`] is the single place it is rolled over to
//! `00:00:00` of the next day.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Format of every decoded timestamp string.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq)]
pub enum TimestampError {
    #[error("date code {0:?} is not 8 ASCII digits (YYMMDDHH)")]
    InvalidDateCode(String),
    #[error("timestamp {0:?} is not a valid calendar date-time")]
    InvalidTimestamp(String),
}

/// Decodes a packed `YYMMDDHH` code into `20YY-MM-DD HH:00:00`.
///
/// The century is always `20`. Hour `24` is kept literally.
pub fn decode_date_code(code: &str) -> Result<String, TimestampError> {
    let code = code.trim();
    if code.len() != 8 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::InvalidDateCode(code.to_string()));
    }

    Ok(format!(
        "20{}-{}-{} {}:00:00",
        &code[0..2],
        &code[2..4],
        &code[4..6],
        &code[6..8]
    ))
}

/// Formats separate year/month/day/hour fields the way SFC records need,
/// zero-padding each to two digits.
pub fn format_hourly(year: &str, month: &str, day: &str, hour: &str) -> String {
    format!("20{year:0>2}-{month:0>2}-{day:0>2} {hour:0>2}:00:00")
}

/// Converts a decoded timestamp to a calendar date-time, rolling hour `24`
/// over to midnight of the following day.
pub fn normalize(timestamp: &str) -> Result<NaiveDateTime, TimestampError> {
    let invalid = || TimestampError::InvalidTimestamp(timestamp.to_string());

    if let Some(date_part) = timestamp.strip_suffix(" 24:00:00") {
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| invalid())?;
        let next = date + Duration::days(1);
        return next.and_hms_opt(0, 0, 0).ok_or_else(invalid);
    }

    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|_| invalid())
}

/// Sorts items chronologically by their normalized timestamp.
///
/// Items whose timestamp cannot be normalized sort after all valid ones,
/// keeping their relative order.
pub fn sort_chronologically<T>(items: &mut [T], timestamp: impl Fn(&T) -> &str) {
    items.sort_by_key(|item| match normalize(timestamp(item)) {
        Ok(dt) => (false, Some(dt)),
        Err(_) => (true, None),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_prefixes_century() {
        assert_eq!(
            decode_date_code("22080701").unwrap(),
            "2022-08-07 01:00:00"
        );
    }

    #[test]
    fn test_decode_keeps_hour_24() {
        let ts = decode_date_code("22080724").unwrap();
        assert_eq!(ts, "2022-08-07 24:00:00");
        assert!(ts.ends_with("24:00:00"));
    }

    #[test]
    fn test_decode_rejects_bad_codes() {
        assert!(decode_date_code("2208071").is_err());
        assert!(decode_date_code("220807011").is_err());
        assert!(decode_date_code("22O80701").is_err());
        assert!(decode_date_code("").is_err());
    }

    #[test]
    fn test_normalize_rolls_hour_24_to_next_day() {
        let dt = normalize("2022-08-07 24:00:00").unwrap();
        assert_eq!(dt.format(TIMESTAMP_FORMAT).to_string(), "2022-08-08 00:00:00");
    }

    #[test]
    fn test_normalize_rolls_over_month_and_year() {
        let dt = normalize("2022-12-31 24:00:00").unwrap();
        assert_eq!(dt.format(TIMESTAMP_FORMAT).to_string(), "2023-01-01 00:00:00");
    }

    #[test]
    fn test_normalize_regular_hour() {
        let dt = normalize("2022-08-07 13:00:00").unwrap();
        assert_eq!(dt.format(TIMESTAMP_FORMAT).to_string(), "2022-08-07 13:00:00");
    }

    #[test]
    fn test_normalize_invalid() {
        assert!(normalize("2022-02-30 01:00:00").is_err());
        assert!(normalize("not a time").is_err());
    }

    #[test]
    fn test_format_hourly_pads_fields() {
        assert_eq!(format_hourly("22", "1", "5", "7"), "2022-01-05 07:00:00");
    }

    #[test]
    fn test_sort_chronologically_handles_hour_24() {
        let mut ts = vec![
            "2022-08-08 01:00:00",
            "2022-08-07 24:00:00",
            "garbage",
            "2022-08-07 23:00:00",
        ];
        sort_chronologically(&mut ts, |t| *t);
        assert_eq!(
            ts,
            vec![
                "2022-08-07 23:00:00",
                "2022-08-07 24:00:00",
                "2022-08-08 01:00:00",
                "garbage",
            ]
        );
    }
}
