//! Free-text calendar date parsing.
//!
//! MDF producers write dates in whatever format their tooling prefers
//! (ISO dates, ISO timestamps, slash-separated dates, `15-Mar-2024`).
//! Only the calendar date is kept; time-of-day and offsets are discarded.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Raw date text that could not be read as a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unparseable date '{raw}'")]
pub struct DateParseError {
    pub raw: String,
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d %Y",
    "%Y%m%d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%a %b %e %H:%M:%S %Y",
];

/// Parse a free-text date into a calendar date.
pub fn parse_free_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let text = raw.trim();
    let fail = || DateParseError {
        raw: raw.to_string(),
    };
    if text.is_empty() {
        return Err(fail());
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Ok(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt.date());
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.date_naive());
    }

    Err(fail())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_free_date("2024-03-15").unwrap(), ymd(2024, 3, 15));
        assert_eq!(parse_free_date("  2024-03-15 ").unwrap(), ymd(2024, 3, 15));
    }

    #[test]
    fn test_parse_other_layouts() {
        assert_eq!(parse_free_date("2024/03/15").unwrap(), ymd(2024, 3, 15));
        assert_eq!(parse_free_date("15-Mar-2024").unwrap(), ymd(2024, 3, 15));
        assert_eq!(parse_free_date("Mar 15 2024").unwrap(), ymd(2024, 3, 15));
    }

    #[test]
    fn test_parse_timestamps_keep_date_only() {
        assert_eq!(
            parse_free_date("2024-03-15T23:59:59").unwrap(),
            ymd(2024, 3, 15)
        );
        assert_eq!(
            parse_free_date("2024-03-15 08:30").unwrap(),
            ymd(2024, 3, 15)
        );
        assert_eq!(
            parse_free_date("2024-03-15T10:00:00+02:00").unwrap(),
            ymd(2024, 3, 15)
        );
    }

    #[test]
    fn test_parse_failure_quotes_raw_text() {
        let err = parse_free_date("next tuesday").unwrap_err();
        assert_eq!(err.raw, "next tuesday");
        assert!(err.to_string().contains("'next tuesday'"));
        assert!(parse_free_date("").is_err());
        assert!(parse_free_date("2024-13-40").is_err());
    }
}
