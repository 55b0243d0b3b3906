//! Task store: the single owner of the task collection.
//!
//! All mutation goes through this API; there are no ambient globals. The
//! auto-scheduler reads a snapshot, computes a full batch, and the store
//! applies it as one swap so an embedder re-rendering mid-computation never
//! observes a half-applied batch.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};

use crate::capacity;
use crate::error::{CoreError, PlacementFailure, Result};
use crate::events::{pick_quip, Event};
use crate::grid::day_key;
use crate::recurrence;
use crate::scheduler::{AutoScheduler, SchedulePlan, ScheduleReport, ScheduleScope, SchedulerOptions};
use crate::slot::Interval;
use crate::storage::{Settings, Snapshot};
use crate::task::{CalendarFilter, Placement, Task, TaskRequest};

/// Outcome of creating a task (or a recurring batch of them).
#[derive(Debug)]
pub struct CreateOutcome {
    /// Ids of the materialized tasks, in occurrence order
    pub created: Vec<String>,
    /// Placement report, when auto-placement was requested
    pub report: Option<ScheduleReport>,
}

/// Owning collection of task records plus celebration bookkeeping.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    settings: Settings,
    /// Day-cleared markers, keyed by day and calendar filter
    celebrated: BTreeSet<String>,
}

impl TaskStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            tasks: Vec::new(),
            settings,
            celebrated: BTreeSet::new(),
        }
    }

    /// Rebuild a store from a loaded snapshot, repairing records that break
    /// the no-overlap invariant (the later of an overlapping pair is
    /// unplaced rather than dropped).
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new(snapshot.settings);
        store.tasks = snapshot.tasks;
        store.repair_overlaps();
        store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings (the settings UI re-saves on every change).
    pub fn set_settings(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
    }

    /// Create a task from a request. A recurrence rule expands into dated
    /// instances (deduplicated against already-materialized occurrences);
    /// with `auto_place`, every new instance goes through the scheduler.
    pub fn create(
        &mut self,
        request: TaskRequest,
        auto_place: bool,
        today: NaiveDate,
    ) -> Result<CreateOutcome> {
        if let Some(pred) = &request.depends_on {
            if self.get(pred).is_none() {
                return Err(CoreError::TaskNotFound(pred.clone()));
            }
        }
        let template = Task::from_request(request)?;
        let instances = recurrence::expand(&template, &self.tasks, today);
        let created: Vec<String> = instances.iter().map(|t| t.id.clone()).collect();
        self.tasks.extend(instances);

        let report = if auto_place {
            let mut combined = ScheduleReport::default();
            for id in &created {
                let report =
                    self.auto_schedule(ScheduleScope::Single(id.clone()), today, None)?;
                combined.placed.extend(report.placed);
                combined.bumped.extend(report.bumped);
                combined.unplaced.extend(report.unplaced);
                combined.events.extend(report.events);
            }
            Some(combined)
        } else {
            None
        };

        Ok(CreateOutcome { created, report })
    }

    /// Replace a task record wholesale after validating it.
    pub fn update(&mut self, task: Task) -> Result<()> {
        task.validate()?;
        let slot = self.get_mut(&task.id)?;
        *slot = task;
        Ok(())
    }

    /// Remove a task. Dependents lose their ordering constraint; nothing
    /// cascades.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))?;
        self.tasks.remove(idx);
        for task in &mut self.tasks {
            if task.depends_on.as_deref() == Some(id) {
                task.depends_on = None;
            }
        }
        Ok(())
    }

    /// Flip completion. When this completes the last placed task of `today`,
    /// emit a single day-cleared signal; the marker keeps it from re-firing
    /// until a new placement lands on that day.
    pub fn toggle_completed(&mut self, id: &str, today: NaiveDate) -> Result<Option<Event>> {
        let task = self.get_mut(id)?;
        task.completed = !task.completed;
        Ok(self.check_day_cleared(today, &CalendarFilter::all()))
    }

    /// Day-cleared probe for an arbitrary day and calendar filter.
    pub fn check_day_cleared(&mut self, date: NaiveDate, filter: &CalendarFilter) -> Option<Event> {
        let day: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.placed_date() == Some(date) && filter.matches(&t.calendar))
            .collect();
        if day.is_empty() || !day.iter().all(|t| t.completed) {
            return None;
        }
        let marker = format!("{}|{}", day_key(date), filter.key());
        if !self.celebrated.insert(marker) {
            return None;
        }
        Some(Event::DayCleared {
            date,
            quip: pick_quip().to_string(),
            chime: true,
            at: Utc::now(),
        })
    }

    /// Manually clear a task's placement. Not counted as a bump.
    pub fn unschedule(&mut self, id: &str) -> Result<()> {
        let task = self.get_mut(id)?;
        task.placement = Placement::Unplaced;
        Ok(())
    }

    /// Manual move (the drag-and-drop seam): validate and apply, or refuse
    /// with a status. Any animation or sound is the caller's follow-up.
    pub fn move_task(
        &mut self,
        id: &str,
        date: NaiveDate,
        start_minute: u32,
        today: NaiveDate,
    ) -> Result<()> {
        let task = self.get(id).ok_or_else(|| CoreError::TaskNotFound(id.to_string()))?;
        let duration = task.duration_minutes;
        let calendar = task.calendar.clone();

        if date < today {
            return Err(CoreError::Validation(
                crate::error::ValidationError::InvalidValue {
                    field: "date".to_string(),
                    message: "cannot move a task into the past".to_string(),
                },
            ));
        }
        let ws = self.settings.work_start_minute;
        let we = self.settings.work_end_minute;
        if start_minute < ws || start_minute + duration > we {
            return Err(PlacementFailure::OutsideWorkday {
                start_minute,
                duration_minutes: duration,
            }
            .into());
        }
        let wanted = Interval::new(start_minute, start_minute + duration);
        let buffer = self.settings.buffer_minutes;
        let filter = CalendarFilter::only(&calendar);
        let blocker = self
            .tasks
            .iter()
            .filter(|t| t.id != id && t.placed_date() == Some(date) && filter.matches(&t.calendar))
            .find(|t| {
                t.interval()
                    .is_some_and(|iv| iv.inflate(buffer).overlaps(&wanted))
            });
        if let Some(other) = blocker {
            return Err(PlacementFailure::Overlap {
                other: other.id.clone(),
            }
            .into());
        }

        let task = self.get_mut(id)?;
        task.placement = Placement::Placed { date, start_minute };
        self.rearm_celebration(date);
        Ok(())
    }

    /// Title substring search, case-insensitive.
    pub fn search(&self, query: &str) -> Vec<&Task> {
        let needle = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Run the auto-scheduler over a snapshot and apply the plan atomically.
    pub fn auto_schedule(
        &mut self,
        scope: ScheduleScope,
        today: NaiveDate,
        options: Option<SchedulerOptions>,
    ) -> Result<ScheduleReport> {
        let scheduler =
            AutoScheduler::with_options(self.settings.clone(), options.unwrap_or_default());
        let plan = scheduler.run(&self.tasks, &scope, today);
        Ok(self.apply_plan(plan))
    }

    /// Re-place past-dated unfinished tasks forward from today.
    pub fn rollover_missed(&mut self, today: NaiveDate) -> Result<ScheduleReport> {
        let scheduler = AutoScheduler::new(self.settings.clone());
        let plan = scheduler.rollover_missed(&self.tasks, today);
        Ok(self.apply_plan(plan))
    }

    /// Swap in a computed batch in one step and re-arm celebrations for days
    /// that received new placements.
    pub fn apply_plan(&mut self, plan: SchedulePlan) -> ScheduleReport {
        let placed_days: Vec<NaiveDate> = plan
            .report
            .placed
            .iter()
            .filter_map(|id| {
                plan.tasks
                    .iter()
                    .find(|t| &t.id == id)
                    .and_then(|t| t.placed_date())
            })
            .collect();
        self.tasks = plan.tasks;
        for date in placed_days {
            self.rearm_celebration(date);
        }
        plan.report
    }

    /// Export the full state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.clone(),
            settings: self.settings.clone(),
        }
    }

    /// A new placement on a celebrated day allows the signal to fire again.
    fn rearm_celebration(&mut self, date: NaiveDate) {
        let prefix = format!("{}|", day_key(date));
        self.celebrated.retain(|marker| !marker.starts_with(&prefix));
    }

    /// Unplace the later task of any buffered overlap within a calendar.
    /// Used when restoring snapshots from untrusted input.
    fn repair_overlaps(&mut self) {
        let buffer = self.settings.buffer_minutes;
        let mut unplace: Vec<String> = Vec::new();
        let mut placed: Vec<(NaiveDate, String, Interval, String)> = self
            .tasks
            .iter()
            .filter_map(|t| {
                Some((
                    t.placed_date()?,
                    t.calendar.clone(),
                    t.interval()?,
                    t.id.clone(),
                ))
            })
            .collect();
        placed.sort_by(|a, b| (a.0, &a.1, a.2.start).cmp(&(b.0, &b.1, b.2.start)));

        let mut kept: Vec<&(NaiveDate, String, Interval, String)> = Vec::new();
        for entry in &placed {
            let conflict = kept.iter().any(|k| {
                k.0 == entry.0 && k.1 == entry.1 && k.2.inflate(buffer).overlaps(&entry.2)
            });
            if conflict {
                unplace.push(entry.3.clone());
            } else {
                kept.push(entry);
            }
        }
        for task in &mut self.tasks {
            if unplace.contains(&task.id) {
                task.placement = Placement::Unplaced;
            }
        }
    }

    /// Minutes booked on a day under a filter (capacity surface for UIs).
    pub fn used_minutes(&self, date: NaiveDate, filter: &CalendarFilter) -> u32 {
        capacity::used_minutes(&self.tasks, date, filter)
    }

    /// Minutes left before the day hits capacity.
    pub fn free_minutes(&self, date: NaiveDate, filter: &CalendarFilter) -> u32 {
        capacity::free_minutes(&self.tasks, date, filter, self.settings.daily_capacity())
    }
}
