//! Task model: the central entity of the scheduler.
//!
//! A task is either Unplaced or Placed on a concrete `(date, start_minute)`.
//! Its time preference is fixed (user-mandated date, optional time) or
//! flexible (the scheduler picks within a requested scope). Fields added in
//! later schema versions carry serde defaults so snapshots written by older
//! versions still load.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::recurrence::RecurrenceRule;
use crate::slot::Interval;

/// Task priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Numeric rank, higher schedules first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Requested date window for a flexible task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlexScope {
    /// Today only
    Today,
    /// Today plus the next two days
    NextTwoDays,
    /// The next seven days
    ThisWeek,
    /// Aim at a specific date
    ByDate { date: NaiveDate },
    /// No preference
    AnyTime,
}

impl Default for FlexScope {
    fn default() -> Self {
        FlexScope::AnyTime
    }
}

/// Fixed or flexible time preference, chosen at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimePreference {
    /// User-mandated date, optionally with an exact start time. The
    /// scheduler must honor it (bumping competitors) or explicitly fail.
    Fixed {
        date: NaiveDate,
        #[serde(default)]
        time: Option<u32>,
    },
    /// The scheduler may choose date and time within the scope.
    Flexible {
        #[serde(default)]
        scope: FlexScope,
    },
}

impl TimePreference {
    pub fn is_flexible(&self) -> bool {
        matches!(self, TimePreference::Flexible { .. })
    }
}

/// Where a task currently sits on the calendar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Placement {
    /// No date/time assigned
    Unplaced,
    /// Concrete day plus minute-of-day start
    Placed { date: NaiveDate, start_minute: u32 },
}

impl Default for Placement {
    fn default() -> Self {
        Placement::Unplaced
    }
}

/// A single schedulable task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, immutable
    pub id: String,
    /// Display title
    pub title: String,
    /// Required duration in minutes
    pub duration_minutes: u32,
    /// Scheduling priority
    #[serde(default)]
    pub priority: Priority,
    /// Calendar tag partitioning tasks into independent namespaces
    #[serde(default = "default_calendar")]
    pub calendar: String,
    /// Fixed or flexible time preference
    pub preference: TimePreference,
    /// Current placement
    #[serde(default)]
    pub placement: Placement,
    /// Completed by explicit user action only
    #[serde(default)]
    pub completed: bool,
    /// Times an automatic process displaced this task from a placed slot
    #[serde(default)]
    pub bump_count: u32,
    /// Set when an automatic process moved or unplaced this task
    #[serde(default)]
    pub rescheduled: bool,
    /// Predecessor task id; this task may not start before its end
    #[serde(default)]
    pub depends_on: Option<String>,
    /// Repeat rule, present only on a template before expansion
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    /// Shared id across instances expanded from one template
    #[serde(default)]
    pub recurrence_group_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

fn default_calendar() -> String {
    "work".to_string()
}

/// Task-creation request handed in by the UI (spec-level input shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_calendar")]
    pub calendar: String,
    pub preference: TimePreference,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default)]
    pub depends_on: Option<String>,
}

impl Task {
    /// Build a validated task from a creation request.
    pub fn from_request(request: TaskRequest) -> Result<Self, ValidationError> {
        let task = Self {
            id: Uuid::new_v4().to_string(),
            title: request.title,
            duration_minutes: request.duration_minutes,
            priority: request.priority,
            calendar: request.calendar,
            preference: request.preference,
            placement: Placement::Unplaced,
            completed: false,
            bump_count: 0,
            rescheduled: false,
            depends_on: request.depends_on,
            recurrence: request.recurrence,
            recurrence_group_id: None,
            created_at: Utc::now(),
        };
        task.validate()?;
        Ok(task)
    }

    /// Check the data-model invariants that do not need calendar context.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.duration_minutes == 0 {
            return Err(ValidationError::NonPositiveDuration(0));
        }
        Ok(())
    }

    pub fn is_placed(&self) -> bool {
        matches!(self.placement, Placement::Placed { .. })
    }

    pub fn is_flexible(&self) -> bool {
        self.preference.is_flexible()
    }

    /// Day this task sits on, if placed.
    pub fn placed_date(&self) -> Option<NaiveDate> {
        match self.placement {
            Placement::Placed { date, .. } => Some(date),
            Placement::Unplaced => None,
        }
    }

    /// Occupied minute-of-day interval, if placed.
    pub fn interval(&self) -> Option<Interval> {
        match self.placement {
            Placement::Placed { start_minute, .. } => Some(Interval::new(
                start_minute,
                start_minute + self.duration_minutes,
            )),
            Placement::Unplaced => None,
        }
    }

    /// End minute-of-day, if placed.
    pub fn end_minute(&self) -> Option<u32> {
        self.interval().map(|iv| iv.end)
    }

    /// The date this task asks for, used for ordering and recurrence dedup.
    pub fn requested_date(&self) -> Option<NaiveDate> {
        match &self.preference {
            TimePreference::Fixed { date, .. } => Some(*date),
            TimePreference::Flexible { scope } => match scope {
                FlexScope::ByDate { date } => Some(*date),
                _ => self.placed_date(),
            },
        }
    }
}

/// Set of calendar tags a query is scoped to. Empty means "all calendars".
///
/// Capacity and conflict checks never cross calendars unless the filter
/// includes both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarFilter(BTreeSet<String>);

impl CalendarFilter {
    /// Match every calendar.
    pub fn all() -> Self {
        Self(BTreeSet::new())
    }

    /// Match exactly one calendar tag.
    pub fn only(calendar: &str) -> Self {
        let mut set = BTreeSet::new();
        set.insert(calendar.to_string());
        Self(set)
    }

    /// Match a set of calendar tags.
    pub fn of<I: IntoIterator<Item = String>>(calendars: I) -> Self {
        Self(calendars.into_iter().collect())
    }

    pub fn matches(&self, calendar: &str) -> bool {
        self.0.is_empty() || self.0.contains(calendar)
    }

    /// Stable key for per-filter bookkeeping (celebration markers).
    pub fn key(&self) -> String {
        if self.0.is_empty() {
            "*".to_string()
        } else {
            self.0.iter().cloned().collect::<Vec<_>>().join(",")
        }
    }
}
