//! Scheduling commands: auto-placement, the week view, rollover.

use clap::Subcommand;

use chaoscontrol_core::grid::{format_hm, start_of_week, week_days};
use chaoscontrol_core::holidays::is_holiday;
use chaoscontrol_core::{CalendarFilter, ScheduleScope, SchedulerOptions};
use chrono::Duration;

use crate::common::{open_store, save_store, today, CliResult};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Place unplaced tasks automatically
    Auto {
        /// Place only this task
        #[arg(long)]
        id: Option<String>,
        /// Place fixed tasks even on days already at capacity
        #[arg(long)]
        allow_overbook: bool,
    },
    /// Show the week grid
    Week {
        /// Week offset from the current week
        #[arg(long, default_value = "0")]
        offset: i64,
    },
    /// Pull past unfinished tasks forward
    Rollover,
}

pub fn run(action: ScheduleAction) -> CliResult {
    let mut store = open_store()?;

    match action {
        ScheduleAction::Auto { id, allow_overbook } => {
            let scope = match id {
                Some(id) => ScheduleScope::Single(id),
                None => ScheduleScope::AllUnplaced,
            };
            let options = SchedulerOptions {
                allow_overbook,
                ..SchedulerOptions::default()
            };
            let report = store.auto_schedule(scope, today(), Some(options))?;
            save_store(&store)?;

            println!("placed: {}", report.placed.len());
            for id in &report.bumped {
                println!("bumped: {id}");
            }
            for unplaced in &report.unplaced {
                println!("not placed ({}): {}", unplaced.id, unplaced.reason);
            }
        }
        ScheduleAction::Week { offset } => {
            let cursor = start_of_week(today(), store.settings().week_start())
                + Duration::weeks(offset);
            let all = CalendarFilter::all();
            for day in week_days(cursor) {
                let marker = if is_holiday(day) { " (holiday)" } else { "" };
                println!(
                    "{} {}{}  used {}min / free {}min",
                    day.format("%a"),
                    day,
                    marker,
                    store.used_minutes(day, &all),
                    store.free_minutes(day, &all),
                );
                let mut placed: Vec<_> = store
                    .tasks()
                    .iter()
                    .filter(|t| t.placed_date() == Some(day))
                    .collect();
                placed.sort_by_key(|t| t.interval().map(|iv| iv.start));
                for task in placed {
                    let iv = match task.interval() {
                        Some(iv) => iv,
                        None => continue,
                    };
                    let done = if task.completed { "x" } else { " " };
                    println!(
                        "  [{done}] {}-{}  {}  [{}]",
                        format_hm(iv.start),
                        format_hm(iv.end),
                        task.title,
                        task.calendar,
                    );
                }
            }
        }
        ScheduleAction::Rollover => {
            let report = store.rollover_missed(today())?;
            save_store(&store)?;
            println!("rolled over: {}", report.placed.len());
            for unplaced in &report.unplaced {
                println!("not placed ({}): {}", unplaced.id, unplaced.reason);
            }
        }
    }
    Ok(())
}
