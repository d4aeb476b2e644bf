//! Date parsing for the subscription column.
//!
//! The layout is not pinned up front: the first non-empty value picks one
//! of the known layouts and every later value must parse with that same
//! layout.

use anyhow::{anyhow, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

/// Date-only layouts, tried in order. Slash dates are read month first.
static DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Layouts carrying a time of day, which is discarded
static DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// A recognised date layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Date(&'static str),
    DateTime(&'static str),
    Rfc3339,
}

impl DateFormat {
    /// Find the first known layout that accepts `value`
    pub fn detect(value: &str) -> Option<Self> {
        let value = value.trim();
        DATE_FORMATS
            .iter()
            .map(|f| DateFormat::Date(*f))
            .chain(DATETIME_FORMATS.iter().map(|f| DateFormat::DateTime(*f)))
            .chain(std::iter::once(DateFormat::Rfc3339))
            .find(|format| format.parse(value).is_some())
    }

    /// Parse `value` with this layout, keeping only the calendar date
    pub fn parse(&self, value: &str) -> Option<NaiveDate> {
        match self {
            DateFormat::Date(fmt) => NaiveDate::parse_from_str(value, fmt).ok(),
            DateFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt)
                .ok()
                .map(|dt| dt.date()),
            DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive()),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateFormat::Date(fmt) | DateFormat::DateTime(fmt) => write!(f, "{}", fmt),
            DateFormat::Rfc3339 => write!(f, "RFC 3339"),
        }
    }
}

/// Parses a column of dates, locking onto the layout of the first value
#[derive(Debug, Default)]
pub struct DateParser {
    format: Option<DateFormat>,
}

impl DateParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The layout chosen so far, if any value has been parsed
    pub fn format(&self) -> Option<DateFormat> {
        self.format
    }

    pub fn parse(&mut self, value: &str) -> crate::Result<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            bail!("empty date value");
        }

        let format = match self.format {
            Some(format) => format,
            None => {
                let format = DateFormat::detect(value)
                    .ok_or_else(|| anyhow!("unrecognised date format: {:?}", value))?;
                tracing::debug!("detected date format {}", format);
                self.format = Some(format);
                format
            }
        };

        format
            .parse(value)
            .ok_or_else(|| anyhow!("date {:?} does not match format {}", value, format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_iso_date() {
        assert_eq!(DateFormat::detect("2020-08-24"), Some(DateFormat::Date("%Y-%m-%d")));
    }

    #[test]
    fn test_detect_datetime_and_rfc3339() {
        let date = NaiveDate::from_ymd_opt(2021, 3, 9).unwrap();

        let format = DateFormat::detect("2021-03-09 14:30:00").unwrap();
        assert_eq!(format, DateFormat::DateTime("%Y-%m-%d %H:%M:%S"));
        assert_eq!(format.parse("2021-03-09 14:30:00"), Some(date));

        let format = DateFormat::detect("2021-03-09T14:30:00+02:00").unwrap();
        assert_eq!(format, DateFormat::Rfc3339);
        assert_eq!(format.parse("2021-03-09T14:30:00+02:00"), Some(date));
    }

    #[test]
    fn test_slash_dates_are_month_first() {
        let mut parser = DateParser::new();
        let date = parser.parse("03/09/2021").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 3, 9).unwrap());
    }

    #[test]
    fn test_first_seen_format_wins() {
        let mut parser = DateParser::new();
        parser.parse("2020-01-15").unwrap();
        assert_eq!(parser.format(), Some(DateFormat::Date("%Y-%m-%d")));

        // A value in a different, otherwise valid layout is rejected
        assert!(parser.parse("01/15/2020").is_err());
        assert!(parser.parse("2022-12-31").is_ok());
    }

    #[test]
    fn test_rejects_garbage_and_empty() {
        let mut parser = DateParser::new();
        assert!(parser.parse("not-a-date").is_err());
        assert!(parser.parse("   ").is_err());
        assert_eq!(parser.format(), None);
    }
}
