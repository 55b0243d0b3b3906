//! Time grid: slot boundaries, minute-of-day parsing, and week navigation.
//!
//! Day keys are always the local calendar day (`NaiveDate`), never a UTC
//! instant sliced to a date -- deriving keys from UTC shifts the day near
//! midnight in non-UTC zones.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::ValidationError;

/// Lazy, finite, restartable sequence of slot start offsets within the
/// workday, stepped by the configured granularity.
pub fn slot_starts(
    work_start: u32,
    work_end: u32,
    granularity: u32,
) -> impl Iterator<Item = u32> + Clone {
    let step = granularity.max(1) as usize;
    (work_start..work_end).step_by(step)
}

/// Canonical local-date key, e.g. "2025-03-01".
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse "HH:MM" into a minute-of-day offset.
pub fn parse_hm(text: &str) -> Result<u32, ValidationError> {
    let malformed = || ValidationError::MalformedTime(text.to_string());
    let (h, m) = text.split_once(':').ok_or_else(malformed)?;
    let hours: u32 = h.parse().map_err(|_| malformed())?;
    let minutes: u32 = m.parse().map_err(|_| malformed())?;
    if hours > 23 || minutes > 59 {
        return Err(malformed());
    }
    Ok(hours * 60 + minutes)
}

/// Format a minute-of-day offset as "HH:MM".
pub fn format_hm(minute: u32) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Parse "YYYY-MM-DD" into a local calendar day.
pub fn parse_day(text: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| ValidationError::MalformedDate(text.to_string()))
}

/// First day of the week containing `date`, for the configured week start.
pub fn start_of_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let back = date.weekday().days_since(week_start);
    date - Duration::days(back as i64)
}

/// The seven days of the week starting at `cursor`.
pub fn week_days(cursor: NaiveDate) -> [NaiveDate; 7] {
    std::array::from_fn(|i| cursor + Duration::days(i as i64))
}
