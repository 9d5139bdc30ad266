//! Inclusive date ranges and the date formats each provider expects.

use crate::types::error::ValidationError;
use crate::types::resolution::Resolution;
use chrono::NaiveDate;
use std::fmt;

const ISO_FORMAT: &str = "%Y-%m-%d";
const COMPACT_FORMAT: &str = "%Y%m%d";

/// An inclusive `start..=end` range of calendar dates, `start <= end` always holds.
///
/// # Examples
///
/// ```
/// use glm_met::DateRange;
///
/// let january = DateRange::parse("2020-01-01", "2020-01-31").unwrap();
/// assert_eq!(january.days(), 31);
/// assert_eq!(january.compact_start(), "20200101");
///
/// // Compact SILO / NASA POWER style dates are accepted too.
/// let same = DateRange::parse("20200101", "20200131").unwrap();
/// assert_eq!(january, same);
///
/// assert!(DateRange::parse("2020-02-01", "2020-01-01").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses both ends from either `YYYY-MM-DD` or `YYYYMMDD`.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// A range covering a single day.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, counting both ends.
    pub fn days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Number of rows a provider should return for this range.
    pub fn timesteps(&self, resolution: Resolution) -> usize {
        self.days() * resolution.steps_per_day()
    }

    pub fn iso_start(&self) -> String {
        self.start.format(ISO_FORMAT).to_string()
    }

    pub fn iso_end(&self) -> String {
        self.end.format(ISO_FORMAT).to_string()
    }

    pub fn compact_start(&self) -> String {
        self.start.format(COMPACT_FORMAT).to_string()
    }

    pub fn compact_end(&self) -> String {
        self.end.format(COMPACT_FORMAT).to_string()
    }

    /// Ensures the whole range lies within what a provider can serve.
    pub(crate) fn validate_within(
        &self,
        provider: &'static str,
        earliest: NaiveDate,
        latest: NaiveDate,
    ) -> Result<(), ValidationError> {
        for date in [self.start, self.end] {
            if date < earliest || date > latest {
                return Err(ValidationError::DateOutsideProviderRange {
                    provider,
                    date,
                    earliest,
                    latest,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.iso_start(), self.iso_end())
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    let format = if trimmed.len() == 8 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        COMPACT_FORMAT
    } else {
        ISO_FORMAT
    };
    NaiveDate::parse_from_str(trimmed, format).map_err(|_| ValidationError::DateParse {
        value: value.to_string(),
        expected: "YYYY-MM-DD or YYYYMMDD",
    })
}

/// Shorthand for the fixed provider bounds, which are always valid dates.
pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}
