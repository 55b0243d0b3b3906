//! Automatic scheduler: greedy, first-fit, deterministic placement.
//!
//! Given a pool of unplaced tasks and the already-placed calendar, decides
//! which day and minute each task goes to:
//! - fixed-date requests first, with bump logic for mandatory times
//! - flexible tasks across an expanding date window, skipping holidays,
//!   past days, and days already at capacity
//! - dependents in a second pass, never earlier than their predecessor's end
//!
//! The run is a pure computation over a cloned task list; the store applies
//! the resulting [`SchedulePlan`] atomically. An unplaceable task is never an
//! error: it stays Unplaced and is listed in the report.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::capacity;
use crate::error::PlacementFailure;
use crate::events::Event;
use crate::holidays;
use crate::slot::{self, Direction, Interval};
use crate::storage::Settings;
use crate::task::{CalendarFilter, FlexScope, Placement, Task, TimePreference};

/// Upper bound on how far ahead a flexible search may wander.
pub const MAX_LOOKAHEAD_DAYS: i64 = 28;

/// Window growth per extension step when the initial scope yields nothing.
const WINDOW_EXTENSION_DAYS: i64 = 7;

/// Which tasks an auto-schedule run considers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleScope {
    /// Every unplaced, incomplete task
    AllUnplaced,
    /// One task by id
    Single(String),
}

/// Caller policy knobs for a run.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Place fixed requests even when the day is at capacity or the
    /// mandatory time cannot be freed. This is the explicit user
    /// confirmation the overbooking invariant requires.
    pub allow_overbook: bool,
    /// Flexible search bound in days from today
    pub lookahead_days: i64,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            allow_overbook: false,
            lookahead_days: MAX_LOOKAHEAD_DAYS,
        }
    }
}

/// A task that stayed unplaced, and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnplacedTask {
    pub id: String,
    pub reason: PlacementFailure,
}

/// Outcome summary of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScheduleReport {
    /// Ids placed during this run
    pub placed: Vec<String>,
    /// Ids displaced to make room for fixed requests
    pub bumped: Vec<String>,
    /// Tasks that remain unplaced after the run
    pub unplaced: Vec<UnplacedTask>,
    /// State-change signals for the embedder
    pub events: Vec<Event>,
}

/// The full batch of intended mutations: the updated task list plus the
/// report. Applied to the store as one atomic swap.
#[derive(Debug, Clone)]
pub struct SchedulePlan {
    pub tasks: Vec<Task>,
    pub report: ScheduleReport,
}

/// Greedy slot-fitting scheduler over a task snapshot.
pub struct AutoScheduler {
    settings: Settings,
    options: SchedulerOptions,
}

impl AutoScheduler {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            options: SchedulerOptions::default(),
        }
    }

    pub fn with_options(settings: Settings, options: SchedulerOptions) -> Self {
        Self { settings, options }
    }

    /// Place every candidate task in the scope. Fixed requests go first by
    /// construction of the ordering (they carry the earliest requested
    /// dates); dependents wait for the second pass.
    pub fn run(&self, tasks: &[Task], scope: &ScheduleScope, today: NaiveDate) -> SchedulePlan {
        let mut snapshot = tasks.to_vec();
        let mut report = ScheduleReport::default();

        let mut queue: Vec<String> = snapshot
            .iter()
            .filter(|t| !t.is_placed() && !t.completed && t.recurrence.is_none())
            .filter(|t| match scope {
                ScheduleScope::AllUnplaced => true,
                ScheduleScope::Single(id) => &t.id == id,
            })
            .map(|t| t.id.clone())
            .collect();
        sort_queue(&mut queue, &snapshot);

        // Pass 1: independent and fixed tasks. Dependents are deferred, and
        // a dependent whose predecessor already sits placed still may not
        // bump anyone.
        let mut deferred = Vec::new();
        for id in queue {
            match predecessor_state(&snapshot, &id) {
                PredecessorState::Waiting => deferred.push(id),
                PredecessorState::Independent => {
                    self.place_one(&mut snapshot, &id, today, true, &mut report)
                }
                PredecessorState::Ready => {
                    self.place_one(&mut snapshot, &id, today, false, &mut report)
                }
            }
        }

        // Pass 2: dependents whose predecessor landed in pass 1. They never
        // trigger bumps themselves.
        for id in deferred {
            match predecessor_state(&snapshot, &id) {
                PredecessorState::Waiting => {
                    let predecessor = predecessor_id(&snapshot, &id).unwrap_or_default();
                    report.unplaced.push(UnplacedTask {
                        id,
                        reason: PlacementFailure::PredecessorUnplaced { predecessor },
                    });
                }
                _ => self.place_one(&mut snapshot, &id, today, false, &mut report),
            }
        }

        // Re-entrant leg: tasks bumped during this run get one flexible
        // re-placement attempt each. Flexible placement cannot bump, so this
        // terminates.
        let mut retried: HashSet<String> = HashSet::new();
        let mut i = 0;
        while i < report.bumped.len() {
            let id = report.bumped[i].clone();
            i += 1;
            if !retried.insert(id.clone()) {
                continue;
            }
            self.place_one(&mut snapshot, &id, today, false, &mut report);
        }

        SchedulePlan {
            tasks: snapshot,
            report,
        }
    }

    /// Recovery for tasks that can no longer sit where they were: unplace
    /// every past-dated unfinished task and re-place it forward from today.
    pub fn rollover_missed(&self, tasks: &[Task], today: NaiveDate) -> SchedulePlan {
        let mut snapshot = tasks.to_vec();
        let mut report = ScheduleReport::default();

        let mut stale = Vec::new();
        for task in snapshot.iter_mut() {
            if !task.completed && task.placed_date().is_some_and(|d| d < today) {
                task.placement = Placement::Unplaced;
                task.bump_count += 1;
                task.rescheduled = true;
                report.events.push(Event::TaskUnplaced {
                    id: task.id.clone(),
                    at: Utc::now(),
                });
                stale.push(task.id.clone());
            }
        }
        sort_queue(&mut stale, &snapshot);

        for id in stale {
            match predecessor_state(&snapshot, &id) {
                PredecessorState::Waiting => {
                    let predecessor = predecessor_id(&snapshot, &id).unwrap_or_default();
                    report.unplaced.push(UnplacedTask {
                        id,
                        reason: PlacementFailure::PredecessorUnplaced { predecessor },
                    });
                }
                PredecessorState::Independent => {
                    self.place_one(&mut snapshot, &id, today, true, &mut report)
                }
                PredecessorState::Ready => {
                    self.place_one(&mut snapshot, &id, today, false, &mut report)
                }
            }
        }

        SchedulePlan {
            tasks: snapshot,
            report,
        }
    }

    fn place_one(
        &self,
        snapshot: &mut [Task],
        id: &str,
        today: NaiveDate,
        allow_bump: bool,
        report: &mut ScheduleReport,
    ) {
        let Some(idx) = index_of(snapshot, id) else {
            return;
        };
        let preference = snapshot[idx].preference.clone();
        let outcome = match preference {
            TimePreference::Fixed { date, time } => {
                self.place_fixed(snapshot, idx, date, time, today, allow_bump, report)
            }
            TimePreference::Flexible { scope } => {
                self.place_flexible(snapshot, idx, scope, today)
            }
        };
        match outcome {
            Ok((date, start_minute)) => {
                let task = &mut snapshot[idx];
                task.placement = Placement::Placed { date, start_minute };
                report.placed.push(task.id.clone());
                report.events.push(Event::TaskPlaced {
                    id: task.id.clone(),
                    date,
                    start_minute,
                    at: Utc::now(),
                });
            }
            Err(reason) => report.unplaced.push(UnplacedTask {
                id: id.to_string(),
                reason,
            }),
        }
    }

    /// Fixed-date placement. The requested date is clamped forward to today;
    /// a mandatory time is honored by bumping lower-priority flexible tasks.
    #[allow(clippy::too_many_arguments)]
    fn place_fixed(
        &self,
        snapshot: &mut [Task],
        idx: usize,
        requested_date: NaiveDate,
        requested_time: Option<u32>,
        today: NaiveDate,
        allow_bump: bool,
        report: &mut ScheduleReport,
    ) -> Result<(NaiveDate, u32), PlacementFailure> {
        let date = requested_date.max(today);
        if holidays::is_holiday(date) {
            return Err(PlacementFailure::HolidayConflict { date });
        }

        let duration = snapshot[idx].duration_minutes;
        let filter = CalendarFilter::only(&snapshot[idx].calendar);
        let (ws, we) = (
            self.settings.work_start_minute,
            self.settings.work_end_minute,
        );
        let buffer = self.settings.buffer_minutes;
        let cap = self.settings.daily_capacity();

        match requested_time {
            Some(time) => {
                if time < ws || time + duration > we {
                    return Err(PlacementFailure::OutsideWorkday {
                        start_minute: time,
                        duration_minutes: duration,
                    });
                }
                // The requested time is mandatory: free it by bumping
                // placed, flexible, incomplete competitors, lowest priority
                // first, largest first within a priority.
                loop {
                    let others = capacity::day_intervals(snapshot, date, &filter);
                    let fits = slot::fits_at(time, duration, &others, ws, we, buffer);
                    let cap_ok = capacity::free_minutes(snapshot, date, &filter, cap) >= duration;
                    if fits && cap_ok {
                        break;
                    }
                    // Only the span blocker matters while the time is busy;
                    // once it is free, any flexible task relieves capacity.
                    let candidate = if allow_bump {
                        bump_candidate(snapshot, idx, date, &filter, time, duration, buffer, !fits)
                    } else {
                        None
                    };
                    match candidate {
                        Some(victim) => {
                            let bumper = snapshot[idx].id.clone();
                            bump(snapshot, victim, &bumper, report);
                        }
                        None if self.options.allow_overbook => break,
                        None => {
                            return Err(PlacementFailure::CapacityExceeded {
                                date,
                                needs_confirmation: true,
                            })
                        }
                    }
                }
                self.check_dependency(snapshot, idx, date, time)?;
                Ok((date, time))
            }
            None => {
                let free = capacity::free_minutes(snapshot, date, &filter, cap);
                if free < duration && !self.options.allow_overbook {
                    return Err(PlacementFailure::CapacityExceeded {
                        date,
                        needs_confirmation: true,
                    });
                }
                let others = capacity::day_intervals(snapshot, date, &filter);
                let start = slot::find_slot(duration, &others, ws, we, buffer, self.direction())
                    .ok_or(PlacementFailure::CapacityExceeded {
                        date,
                        needs_confirmation: true,
                    })?;
                self.check_dependency(snapshot, idx, date, start)?;
                Ok((date, start))
            }
        }
    }

    /// Flexible placement: walk the scope's window day by day, extending in
    /// weekly steps up to the lookahead bound.
    fn place_flexible(
        &self,
        snapshot: &[Task],
        idx: usize,
        scope: FlexScope,
        today: NaiveDate,
    ) -> Result<(NaiveDate, u32), PlacementFailure> {
        let duration = snapshot[idx].duration_minutes;
        let filter = CalendarFilter::only(&snapshot[idx].calendar);
        let (ws, we) = (
            self.settings.work_start_minute,
            self.settings.work_end_minute,
        );
        let buffer = self.settings.buffer_minutes;
        let cap = self.settings.daily_capacity();
        let predecessor = self.predecessor_end(snapshot, idx);

        let horizon = today + Duration::days(self.options.lookahead_days.min(MAX_LOOKAHEAD_DAYS));
        let mut window_end = match scope {
            FlexScope::Today => today,
            FlexScope::NextTwoDays => today + Duration::days(2),
            FlexScope::ThisWeek | FlexScope::AnyTime => today + Duration::days(6),
            FlexScope::ByDate { date } => date.max(today),
        }
        .min(horizon);

        let mut day = today;
        loop {
            while day <= window_end {
                let current = day;
                day += Duration::days(1);

                if holidays::is_holiday(current) {
                    continue;
                }
                if let Some((pred_date, _)) = predecessor {
                    if current < pred_date {
                        continue;
                    }
                }
                // Early capacity check saves the slot walk on full days.
                if capacity::free_minutes(snapshot, current, &filter, cap) < duration {
                    continue;
                }
                let mut others = capacity::day_intervals(snapshot, current, &filter);
                if let Some((pred_date, pred_end)) = predecessor {
                    if current == pred_date {
                        others.push(Interval::new(ws, pred_end));
                    }
                }
                if let Some(start) =
                    slot::find_slot(duration, &others, ws, we, buffer, self.direction())
                {
                    self.check_dependency(snapshot, idx, current, start)?;
                    return Ok((current, start));
                }
            }
            if window_end >= horizon {
                return Err(PlacementFailure::SlotUnavailable {
                    duration_minutes: duration,
                });
            }
            window_end = (window_end + Duration::days(WINDOW_EXTENSION_DAYS)).min(horizon);
        }
    }

    /// A dependent may not start before its predecessor's computed end.
    fn check_dependency(
        &self,
        snapshot: &[Task],
        idx: usize,
        date: NaiveDate,
        start: u32,
    ) -> Result<(), PlacementFailure> {
        if let Some((pred_date, pred_end)) = self.predecessor_end(snapshot, idx) {
            if date < pred_date || (date == pred_date && start < pred_end) {
                let predecessor = snapshot[idx].depends_on.clone().unwrap_or_default();
                return Err(PlacementFailure::DependencyViolation { predecessor });
            }
        }
        Ok(())
    }

    /// Placed predecessor's (date, end minute), if any.
    fn predecessor_end(&self, snapshot: &[Task], idx: usize) -> Option<(NaiveDate, u32)> {
        let pred_id = snapshot[idx].depends_on.as_deref()?;
        let pred = snapshot.iter().find(|t| t.id == pred_id)?;
        Some((pred.placed_date()?, pred.end_minute()?))
    }

    fn direction(&self) -> Direction {
        if self.settings.prefer_mornings {
            Direction::PreferEarly
        } else {
            Direction::PreferLate
        }
    }
}

/// Priority descending, longer duration first, then earlier requested date.
fn sort_queue(queue: &mut [String], snapshot: &[Task]) {
    queue.sort_by(|a, b| {
        let ta = snapshot.iter().find(|t| &t.id == a);
        let tb = snapshot.iter().find(|t| &t.id == b);
        let (Some(ta), Some(tb)) = (ta, tb) else {
            return std::cmp::Ordering::Equal;
        };
        tb.priority
            .rank()
            .cmp(&ta.priority.rank())
            .then(tb.duration_minutes.cmp(&ta.duration_minutes))
            .then(
                ta.requested_date()
                    .unwrap_or(NaiveDate::MAX)
                    .cmp(&tb.requested_date().unwrap_or(NaiveDate::MAX)),
            )
            .then(ta.id.cmp(&tb.id))
    });
}

enum PredecessorState {
    /// No dependency, or the predecessor was deleted
    Independent,
    /// Predecessor exists and is placed
    Ready,
    /// Predecessor exists but is not placed yet
    Waiting,
}

fn predecessor_id(snapshot: &[Task], id: &str) -> Option<String> {
    snapshot
        .iter()
        .find(|t| t.id == id)
        .and_then(|t| t.depends_on.clone())
}

fn predecessor_state(snapshot: &[Task], id: &str) -> PredecessorState {
    let Some(pred_id) = predecessor_id(snapshot, id) else {
        return PredecessorState::Independent;
    };
    match snapshot.iter().find(|t| t.id == pred_id) {
        // A deleted predecessor drops the ordering constraint.
        None => PredecessorState::Independent,
        Some(pred) if pred.is_placed() => PredecessorState::Ready,
        Some(_) => PredecessorState::Waiting,
    }
}

fn index_of(snapshot: &[Task], id: &str) -> Option<usize> {
    snapshot.iter().position(|t| t.id == id)
}

/// Lowest-priority, largest, placed, flexible, incomplete task to displace.
/// With `need_overlap`, only a task whose buffered interval blocks the
/// wanted span qualifies; otherwise any such task relieves capacity.
#[allow(clippy::too_many_arguments)]
fn bump_candidate(
    snapshot: &[Task],
    bumper_idx: usize,
    date: NaiveDate,
    filter: &CalendarFilter,
    time: u32,
    duration: u32,
    buffer: u32,
    need_overlap: bool,
) -> Option<usize> {
    let wanted = Interval::new(time, time + duration);
    let mut candidates: Vec<usize> = snapshot
        .iter()
        .enumerate()
        .filter(|(i, t)| {
            *i != bumper_idx
                && t.is_flexible()
                && !t.completed
                && t.placed_date() == Some(date)
                && filter.matches(&t.calendar)
        })
        .map(|(i, _)| i)
        .collect();
    candidates.sort_by(|&a, &b| {
        let (ta, tb) = (&snapshot[a], &snapshot[b]);
        ta.priority
            .rank()
            .cmp(&tb.priority.rank())
            .then(tb.duration_minutes.cmp(&ta.duration_minutes))
            .then(ta.id.cmp(&tb.id))
    });

    if need_overlap {
        candidates.into_iter().find(|&i| {
            snapshot[i]
                .interval()
                .is_some_and(|iv| iv.inflate(buffer).overlaps(&wanted))
        })
    } else {
        candidates.first().copied()
    }
}

fn bump(snapshot: &mut [Task], victim: usize, bumped_by: &str, report: &mut ScheduleReport) {
    let task = &mut snapshot[victim];
    task.placement = Placement::Unplaced;
    task.bump_count += 1;
    task.rescheduled = true;
    report.bumped.push(task.id.clone());
    report.events.push(Event::TaskBumped {
        id: task.id.clone(),
        bumped_by: bumped_by.to_string(),
        bump_count: task.bump_count,
        at: Utc::now(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;
    use chrono::Datelike;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    // A Monday with no holidays in the following four weeks.
    fn monday() -> NaiveDate {
        d(2025, 3, 3)
    }

    fn task(id: &str, duration: u32, priority: Priority, preference: TimePreference) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            duration_minutes: duration,
            priority,
            calendar: "work".to_string(),
            preference,
            placement: Placement::Unplaced,
            completed: false,
            bump_count: 0,
            rescheduled: false,
            depends_on: None,
            recurrence: None,
            recurrence_group_id: None,
            created_at: Utc::now(),
        }
    }

    fn flex(id: &str, duration: u32, priority: Priority, scope: FlexScope) -> Task {
        task(id, duration, priority, TimePreference::Flexible { scope })
    }

    fn fixed(id: &str, duration: u32, priority: Priority, date: NaiveDate, time: Option<u32>) -> Task {
        task(id, duration, priority, TimePreference::Fixed { date, time })
    }

    fn placed(mut t: Task, date: NaiveDate, start: u32) -> Task {
        t.placement = Placement::Placed {
            date,
            start_minute: start,
        };
        t
    }

    fn scheduler() -> AutoScheduler {
        AutoScheduler::new(Settings::default())
    }

    fn find<'a>(plan: &'a SchedulePlan, id: &str) -> &'a Task {
        plan.tasks.iter().find(|t| t.id == id).unwrap()
    }

    #[test]
    fn empty_day_lands_at_nine() {
        // Spec scenario A.
        let tasks = vec![flex("a", 60, Priority::Medium, FlexScope::Today)];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(
            find(&plan, "a").placement,
            Placement::Placed {
                date: monday(),
                start_minute: 540
            }
        );
        assert!(plan.report.unplaced.is_empty());
    }

    #[test]
    fn buffered_neighbor_lands_at_ten_oh_five() {
        // Spec scenario B.
        let tasks = vec![
            placed(
                flex("busy", 60, Priority::Medium, FlexScope::Today),
                monday(),
                540,
            ),
            flex("new", 60, Priority::Medium, FlexScope::Today),
        ];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(
            find(&plan, "new").placement,
            Placement::Placed {
                date: monday(),
                start_minute: 605
            }
        );
    }

    #[test]
    fn fixed_time_bumps_low_priority_until_free() {
        // Spec scenario C: day full of low-priority flexible tasks; a fixed
        // 09:00 request clears them out and lands exactly at 09:00.
        let mut tasks: Vec<Task> = (0..4)
            .map(|i| {
                placed(
                    flex(&format!("low{i}"), 120, Priority::Low, FlexScope::Today),
                    monday(),
                    540 + i * 120,
                )
            })
            .collect();
        tasks.push(fixed("urgent", 60, Priority::High, monday(), Some(540)));

        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(
            find(&plan, "urgent").placement,
            Placement::Placed {
                date: monday(),
                start_minute: 540
            }
        );
        // The displaced task is retried after the fixed placements land; the
        // day has no room left so it rolls to the next one.
        let bumped = find(&plan, "low0");
        assert_eq!(bumped.bump_count, 1);
        assert!(bumped.rescheduled);
        assert_eq!(bumped.placed_date(), Some(d(2025, 3, 4)));
        assert!(plan.report.bumped.contains(&"low0".to_string()));
    }

    #[test]
    fn fixed_past_date_clamps_to_today() {
        let tasks = vec![fixed("late", 30, Priority::Medium, d(2025, 2, 10), None)];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(find(&plan, "late").placed_date(), Some(monday()));
    }

    #[test]
    fn fixed_on_holiday_is_refused() {
        // Good Friday 2025.
        let tasks = vec![fixed("gf", 30, Priority::Medium, d(2025, 4, 18), Some(540))];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, d(2025, 4, 14));
        assert_eq!(find(&plan, "gf").placement, Placement::Unplaced);
        assert_eq!(
            plan.report.unplaced[0].reason,
            PlacementFailure::HolidayConflict { date: d(2025, 4, 18) }
        );
    }

    #[test]
    fn flexible_skips_holidays() {
        // Starting the search on Good Friday: placement falls to the next
        // working day.
        let tasks = vec![flex("a", 60, Priority::Medium, FlexScope::ThisWeek)];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, d(2025, 4, 18));
        assert_eq!(find(&plan, "a").placed_date(), Some(d(2025, 4, 19)));
    }

    #[test]
    fn full_day_is_skipped_without_slot_search() {
        // Capacity 480 min exactly consumed; the flexible task moves on to
        // the next day even though no interval strictly blocks it.
        let tasks = vec![
            placed(
                flex("filler", 480, Priority::Medium, FlexScope::Today),
                monday(),
                540,
            ),
            flex("next", 60, Priority::Medium, FlexScope::ThisWeek),
        ];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(find(&plan, "next").placed_date(), Some(d(2025, 3, 4)));
    }

    #[test]
    fn window_extends_before_giving_up() {
        // Each of the next 28 days is full except day 20: the today-scoped
        // window must grow to reach it.
        let mut tasks: Vec<Task> = (0..29)
            .filter(|&i| i != 20)
            .map(|i| {
                placed(
                    flex(&format!("full{i}"), 480, Priority::Medium, FlexScope::Today),
                    monday() + Duration::days(i),
                    540,
                )
            })
            .collect();
        tasks.push(flex("wanderer", 60, Priority::Medium, FlexScope::Today));

        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(
            find(&plan, "wanderer").placed_date(),
            Some(monday() + Duration::days(20))
        );
    }

    #[test]
    fn exhausted_lookahead_reports_slot_unavailable() {
        let mut tasks: Vec<Task> = (0..29)
            .map(|i| {
                placed(
                    flex(&format!("full{i}"), 480, Priority::Medium, FlexScope::Today),
                    monday() + Duration::days(i),
                    540,
                )
            })
            .collect();
        tasks.push(flex("homeless", 60, Priority::Medium, FlexScope::AnyTime));

        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(find(&plan, "homeless").placement, Placement::Unplaced);
        assert_eq!(
            plan.report.unplaced[0].reason,
            PlacementFailure::SlotUnavailable { duration_minutes: 60 }
        );
    }

    #[test]
    fn prefer_evenings_walks_from_the_end() {
        let settings = Settings {
            prefer_mornings: false,
            ..Settings::default()
        };
        let tasks = vec![flex("owl", 60, Priority::Medium, FlexScope::Today)];
        let plan = AutoScheduler::new(settings).run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(
            find(&plan, "owl").placement,
            Placement::Placed {
                date: monday(),
                start_minute: 960
            }
        );
    }

    #[test]
    fn dependent_waits_for_predecessor_and_lands_after_it() {
        // Spec scenario E, both tasks in one batch: the dependent is
        // deferred to pass 2 and starts no earlier than the predecessor's
        // end.
        let mut first = flex("first", 60, Priority::Low, FlexScope::Today);
        first.id = "first".to_string();
        let mut second = flex("second", 60, Priority::High, FlexScope::Today);
        second.depends_on = Some("first".to_string());

        let plan = scheduler().run(&[first, second], &ScheduleScope::AllUnplaced, monday());
        let first_end = find(&plan, "first").end_minute().unwrap();
        match find(&plan, "second").placement {
            Placement::Placed { date, start_minute } => {
                assert_eq!(date, monday());
                assert!(start_minute >= first_end);
            }
            Placement::Unplaced => panic!("dependent should be placed in pass 2"),
        }
    }

    #[test]
    fn dependent_with_unplaced_predecessor_is_skipped() {
        let first = flex("first", 600, Priority::Low, FlexScope::Today); // cannot fit
        let mut second = flex("second", 30, Priority::High, FlexScope::Today);
        second.depends_on = Some("first".to_string());

        let plan = scheduler().run(&[first, second], &ScheduleScope::AllUnplaced, monday());
        assert_eq!(find(&plan, "second").placement, Placement::Unplaced);
        assert!(plan.report.unplaced.iter().any(|u| {
            u.id == "second"
                && u.reason
                    == PlacementFailure::PredecessorUnplaced {
                        predecessor: "first".to_string(),
                    }
        }));
    }

    #[test]
    fn dependent_fixed_before_predecessor_end_is_refused() {
        let mut first = placed(
            flex("first", 120, Priority::Medium, FlexScope::Today),
            monday(),
            540,
        );
        first.calendar = "home".to_string();
        let mut early = fixed("early", 30, Priority::High, monday(), Some(540 + 30));
        early.depends_on = Some("first".to_string());
        // 09:30 precedes the predecessor's 11:00 end.
        let plan = scheduler().run(&[first, early], &ScheduleScope::AllUnplaced, monday());
        assert_eq!(find(&plan, "early").placement, Placement::Unplaced);
        assert!(matches!(
            plan.report.unplaced[0].reason,
            PlacementFailure::DependencyViolation { .. }
        ));
    }

    #[test]
    fn fixed_without_time_reports_capacity_failure() {
        let tasks = vec![
            placed(
                flex("filler", 480, Priority::Medium, FlexScope::Today),
                monday(),
                540,
            ),
            fixed("squeezed", 60, Priority::Medium, monday(), None),
        ];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(
            plan.report.unplaced[0].reason,
            PlacementFailure::CapacityExceeded {
                date: monday(),
                needs_confirmation: true
            }
        );
    }

    #[test]
    fn overbook_override_places_anyway() {
        let tasks = vec![
            placed(
                flex("filler", 480, Priority::Medium, FlexScope::Today),
                monday(),
                540,
            ),
            fixed("forced", 60, Priority::Medium, monday(), Some(540)),
        ];
        // The filler is flexible so the bump loop clears it even without the
        // override; pin it down by marking it completed (not bumpable).
        let mut tasks = tasks;
        tasks[0].completed = true;

        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(find(&plan, "forced").placement, Placement::Unplaced);

        let options = SchedulerOptions {
            allow_overbook: true,
            ..SchedulerOptions::default()
        };
        let plan = AutoScheduler::with_options(Settings::default(), options).run(
            &tasks,
            &ScheduleScope::AllUnplaced,
            monday(),
        );
        assert_eq!(
            find(&plan, "forced").placement,
            Placement::Placed {
                date: monday(),
                start_minute: 540
            }
        );
    }

    #[test]
    fn bumped_task_is_replaced_in_the_same_run() {
        // One low task sits at 09:00; a fixed request wants that exact time.
        // The bumped task should come back later the same day.
        let tasks = vec![
            placed(
                flex("resident", 60, Priority::Low, FlexScope::Today),
                monday(),
                540,
            ),
            fixed("claimant", 60, Priority::High, monday(), Some(540)),
        ];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(
            find(&plan, "claimant").placement,
            Placement::Placed {
                date: monday(),
                start_minute: 540
            }
        );
        let resident = find(&plan, "resident");
        assert_eq!(resident.bump_count, 1);
        match resident.placement {
            Placement::Placed { date, start_minute } => {
                assert_eq!(date, monday());
                assert!(start_minute >= 605);
            }
            Placement::Unplaced => panic!("bumped task should be re-placed"),
        }
    }

    #[test]
    fn ordering_high_and_long_first() {
        let mut queue = vec!["short_high".to_string(), "long_low".to_string(), "long_high".to_string()];
        let snapshot = vec![
            flex("short_high", 30, Priority::High, FlexScope::AnyTime),
            flex("long_low", 120, Priority::Low, FlexScope::AnyTime),
            flex("long_high", 120, Priority::High, FlexScope::AnyTime),
        ];
        sort_queue(&mut queue, &snapshot);
        assert_eq!(queue, vec!["long_high", "short_high", "long_low"]);
    }

    #[test]
    fn rollover_reschedules_past_unfinished_tasks() {
        let tasks = vec![
            placed(
                flex("missed", 60, Priority::Medium, FlexScope::AnyTime),
                d(2025, 2, 24),
                540,
            ),
            placed(
                flex("done_past", 30, Priority::Medium, FlexScope::AnyTime),
                d(2025, 2, 24),
                660,
            ),
        ];
        let mut tasks = tasks;
        tasks[1].completed = true;

        let plan = scheduler().rollover_missed(&tasks, monday());
        let missed = find(&plan, "missed");
        assert!(missed.placed_date().unwrap() >= monday());
        assert_eq!(missed.bump_count, 1);
        assert!(missed.rescheduled);
        // Completed history is left alone.
        assert_eq!(find(&plan, "done_past").placed_date(), Some(d(2025, 2, 24)));
    }

    #[test]
    fn placements_never_cross_into_the_past() {
        let today = monday();
        let tasks = vec![
            fixed("old_fixed", 30, Priority::Medium, d(2024, 12, 2), None),
            flex("any", 30, Priority::Low, FlexScope::AnyTime),
        ];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, today);
        for task in plan.tasks.iter().filter(|t| t.is_placed()) {
            assert!(task.placed_date().unwrap() >= today, "{} in the past", task.id);
        }
    }

    #[test]
    fn calendars_do_not_conflict() {
        // Same minute on the same day in two calendars is fine.
        let tasks = vec![
            placed(
                flex("work_item", 480, Priority::Medium, FlexScope::Today),
                monday(),
                540,
            ),
            {
                let mut t = flex("home_item", 60, Priority::Medium, FlexScope::Today);
                t.calendar = "home".to_string();
                t
            },
        ];
        let plan = scheduler().run(&tasks, &ScheduleScope::AllUnplaced, monday());
        assert_eq!(
            find(&plan, "home_item").placement,
            Placement::Placed {
                date: monday(),
                start_minute: 540
            }
        );
    }

    #[test]
    fn single_scope_leaves_other_tasks_alone() {
        let tasks = vec![
            flex("wanted", 30, Priority::Medium, FlexScope::Today),
            flex("bystander", 30, Priority::High, FlexScope::Today),
        ];
        let plan = scheduler().run(
            &tasks,
            &ScheduleScope::Single("wanted".to_string()),
            monday(),
        );
        assert!(find(&plan, "wanted").is_placed());
        assert!(!find(&plan, "bystander").is_placed());
    }

    #[test]
    fn lookahead_is_bounded() {
        assert!(monday().weekday() == chrono::Weekday::Mon);
        let opts = SchedulerOptions {
            lookahead_days: 10_000,
            ..SchedulerOptions::default()
        };
        // The guard clamps runaway configuration to MAX_LOOKAHEAD_DAYS.
        let mut tasks: Vec<Task> = (0..29)
            .map(|i| {
                placed(
                    flex(&format!("full{i}"), 480, Priority::Medium, FlexScope::Today),
                    monday() + Duration::days(i),
                    540,
                )
            })
            .collect();
        tasks.push(flex("capped", 60, Priority::Medium, FlexScope::AnyTime));
        let plan = AutoScheduler::with_options(Settings::default(), opts).run(
            &tasks,
            &ScheduleScope::AllUnplaced,
            monday(),
        );
        assert_eq!(find(&plan, "capped").placement, Placement::Unplaced);
    }
}
