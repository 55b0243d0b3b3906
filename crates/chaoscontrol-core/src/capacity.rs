//! Per-day capacity tracking.
//!
//! Sums busy minutes from placed tasks on a day, scoped by calendar filter,
//! and derives free minutes against the configured daily capacity.
//! Overbooking (used > capacity) is a warning condition the tracker reports;
//! callers decide whether to block.

use chrono::NaiveDate;

use crate::slot::Interval;
use crate::task::{CalendarFilter, Task};

/// Total busy minutes from placed tasks on `date` matching `filter`.
///
/// Completed tasks still count: a finished task occupied its slot.
pub fn used_minutes(tasks: &[Task], date: NaiveDate, filter: &CalendarFilter) -> u32 {
    tasks
        .iter()
        .filter(|t| t.placed_date() == Some(date) && filter.matches(&t.calendar))
        .map(|t| t.duration_minutes)
        .sum()
}

/// Remaining minutes before the day hits `daily_capacity`, floored at zero.
pub fn free_minutes(
    tasks: &[Task],
    date: NaiveDate,
    filter: &CalendarFilter,
    daily_capacity: u32,
) -> u32 {
    daily_capacity.saturating_sub(used_minutes(tasks, date, filter))
}

/// Whether the day's booked minutes exceed capacity.
pub fn is_overbooked(
    tasks: &[Task],
    date: NaiveDate,
    filter: &CalendarFilter,
    daily_capacity: u32,
) -> bool {
    used_minutes(tasks, date, filter) > daily_capacity
}

/// Occupied intervals on `date` matching `filter`, sorted by start.
pub fn day_intervals(tasks: &[Task], date: NaiveDate, filter: &CalendarFilter) -> Vec<Interval> {
    let mut intervals: Vec<Interval> = tasks
        .iter()
        .filter(|t| t.placed_date() == Some(date) && filter.matches(&t.calendar))
        .filter_map(|t| t.interval())
        .collect();
    intervals.sort_by_key(|iv| (iv.start, iv.end));
    intervals
}
