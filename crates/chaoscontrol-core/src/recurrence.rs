//! Recurrence expansion: turn a repeating template into dated task instances.
//!
//! Instances are independent tasks sharing a `recurrence_group_id`; there is
//! no live link back to the template. Re-expanding an edited template skips
//! occurrences that already exist (same group, date, and title).

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::{FlexScope, Placement, Task, TimePreference};

/// Default expansion horizon when no end condition cuts earlier.
pub const DEFAULT_HORIZON_DAYS: i64 = 84;

/// Hard cap on instances per expansion, regardless of the requested count.
pub const MAX_INSTANCES: usize = 100;

/// Repeat frequency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    /// Every day, skipping Saturday and Sunday
    Weekdays,
}

/// End condition for a repeat rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecurrenceEnd {
    /// Stop after this many occurrences
    Count { count: u32 },
    /// Stop after this date
    Until { date: NaiveDate },
    /// No explicit end; the default horizon applies
    Open,
}

impl Default for RecurrenceEnd {
    fn default() -> Self {
        RecurrenceEnd::Open
    }
}

/// A repeat rule attached to a task template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub end: RecurrenceEnd,
}

fn default_interval() -> u32 {
    1
}

/// Expand a template into concrete dated instances.
///
/// The first occurrence is always produced, even under a degenerate rule.
/// Stops at whichever of the count limit, the until date, or the default
/// horizon comes first, and never exceeds [`MAX_INSTANCES`].
pub fn expand(template: &Task, existing: &[Task], today: NaiveDate) -> Vec<Task> {
    let rule = match &template.recurrence {
        Some(rule) => rule.clone(),
        None => return vec![template.clone()],
    };

    let group = template
        .recurrence_group_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let start = template.requested_date().unwrap_or(today);
    let horizon = start + Duration::days(DEFAULT_HORIZON_DAYS);
    let interval = rule.interval.max(1);

    let mut instances = Vec::new();
    let mut date = start;
    let mut occurrences = 0usize;

    loop {
        if !already_materialized(existing, &group, &template.title, date) {
            instances.push(instance_at(template, &group, date));
        }
        occurrences += 1;

        if occurrences >= MAX_INSTANCES {
            break;
        }
        if let RecurrenceEnd::Count { count } = rule.end {
            if occurrences >= count as usize {
                break;
            }
        }
        let steps = occurrences as u32;
        date = match rule.frequency {
            Frequency::Daily => start + Duration::days((interval * steps) as i64),
            Frequency::Weekly => start + Duration::days((7 * interval * steps) as i64),
            // Anchored on the start's day-of-month so a clamped short month
            // does not shorten every later occurrence.
            Frequency::Monthly => add_months_clamped(start, interval * steps),
            Frequency::Weekdays => next_weekday(date),
        };
        if let RecurrenceEnd::Until { date: until } = rule.end {
            if date > until {
                break;
            }
        }
        if date > horizon {
            break;
        }
    }

    instances
}

fn instance_at(template: &Task, group: &str, date: NaiveDate) -> Task {
    let preference = match &template.preference {
        TimePreference::Fixed { time, .. } => TimePreference::Fixed { date, time: *time },
        // Flexible instances aim at their occurrence date so each lands in
        // its own period and dedup has a date to compare.
        TimePreference::Flexible { .. } => TimePreference::Flexible {
            scope: FlexScope::ByDate { date },
        },
    };
    Task {
        id: Uuid::new_v4().to_string(),
        preference,
        placement: Placement::Unplaced,
        completed: false,
        bump_count: 0,
        rescheduled: false,
        recurrence: None,
        recurrence_group_id: Some(group.to_string()),
        created_at: Utc::now(),
        ..template.clone()
    }
}

fn already_materialized(existing: &[Task], group: &str, title: &str, date: NaiveDate) -> bool {
    existing.iter().any(|t| {
        t.recurrence_group_id.as_deref() == Some(group)
            && t.title == title
            && t.requested_date() == Some(date)
    })
}

/// Step `months` calendar months forward, clamping to the last day of a
/// shorter target month instead of rolling over.
fn add_months_clamped(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let mut day = date.day();
    loop {
        if let Some(next) = NaiveDate::from_ymd_opt(year, month, day) {
            return next;
        }
        day -= 1;
    }
}

fn next_weekday(date: NaiveDate) -> NaiveDate {
    let mut next = date + Duration::days(1);
    while matches!(next.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
        next += Duration::days(1);
    }
    next
}
