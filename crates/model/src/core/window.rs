use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use thiserror::Error;

/// Date format accepted for the export day.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Format used when rendering window bounds.
pub const BOUND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("Invalid export day '{0}', expected YYYY-MM-DD")]
    InvalidDay(String),

    #[error("Export day {0} has no following calendar day")]
    OutOfRange(NaiveDate),
}

/// Half-open timestamp interval `[start, end)` covering exactly one calendar day.
///
/// Both bounds are naive local timestamps; no timezone conversion is applied
/// on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExportWindow {
    day: NaiveDate,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl ExportWindow {
    pub fn for_day(day: NaiveDate) -> Result<Self, WindowError> {
        let next = day
            .checked_add_days(Days::new(1))
            .ok_or(WindowError::OutOfRange(day))?;

        Ok(ExportWindow {
            day,
            start: day.and_time(NaiveTime::MIN),
            end: next.and_time(NaiveTime::MIN),
        })
    }

    /// Parses a strict `YYYY-MM-DD` day string.
    pub fn parse(day: &str) -> Result<Self, WindowError> {
        Self::for_day(parse_day(day)?)
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts < self.end
    }
}

impl fmt::Display for ExportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format(BOUND_FORMAT),
            self.end.format(BOUND_FORMAT)
        )
    }
}

/// Parses an export day, rejecting anything that is not zero-padded `YYYY-MM-DD`.
pub fn parse_day(day: &str) -> Result<NaiveDate, WindowError> {
    let trimmed = day.trim();
    // chrono accepts unpadded fields, the day string is a file name component
    if trimmed.len() != 10 {
        return Err(WindowError::InvalidDay(day.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
        .map_err(|_| WindowError::InvalidDay(day.to_string()))
}
