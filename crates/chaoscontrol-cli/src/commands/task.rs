//! Task management commands.

use clap::Subcommand;

use chaoscontrol_core::grid::{format_hm, parse_day, parse_hm};
use chaoscontrol_core::{
    Event, FlexScope, Frequency, Placement, Priority, RecurrenceEnd, RecurrenceRule, Task,
    TaskRequest, TimePreference,
};

use crate::common::{open_store, save_store, today, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task (auto-scheduled unless --no-schedule)
    Create {
        /// Task title
        title: String,
        /// Duration in minutes
        #[arg(long, default_value = "30")]
        duration: u32,
        /// Priority: low, medium, high
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Calendar name
        #[arg(long, default_value = "work")]
        calendar: String,
        /// Pin to a date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Mandatory start time (HH:MM); requires --date
        #[arg(long, requires = "date")]
        time: Option<String>,
        /// Flexible window: today, soon, week, any
        #[arg(long, conflicts_with = "date")]
        scope: Option<String>,
        /// Flexible target date (YYYY-MM-DD)
        #[arg(long, conflicts_with_all = ["date", "scope"])]
        by: Option<String>,
        /// Predecessor task id
        #[arg(long)]
        after: Option<String>,
        /// Repeat rule: daily, weekly, monthly, weekdays
        #[arg(long)]
        repeat: Option<String>,
        /// Repeat every N periods
        #[arg(long, default_value = "1", requires = "repeat")]
        every: u32,
        /// Stop after N occurrences
        #[arg(long, requires = "repeat")]
        count: Option<u32>,
        /// Stop after this date (YYYY-MM-DD)
        #[arg(long, requires = "repeat", conflicts_with = "count")]
        until: Option<String>,
        /// Create without placing it on the calendar
        #[arg(long)]
        no_schedule: bool,
    },
    /// List tasks
    List {
        /// Filter by calendar
        #[arg(long)]
        calendar: Option<String>,
        /// Filter by placed date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Only unplaced tasks
        #[arg(long)]
        unplaced: bool,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Update a task
    Update {
        /// Task ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New duration in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// New priority
        #[arg(long)]
        priority: Option<String>,
        /// New calendar
        #[arg(long)]
        calendar: Option<String>,
        /// New predecessor id; empty string clears it
        #[arg(long)]
        after: Option<String>,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Toggle completion
    Complete {
        /// Task ID
        id: String,
    },
    /// Move a placed task to a specific day and time
    Move {
        /// Task ID
        id: String,
        /// Target date (YYYY-MM-DD)
        date: String,
        /// Target start time (HH:MM)
        time: String,
    },
    /// Clear a task's placement
    Unschedule {
        /// Task ID
        id: String,
    },
    /// Title substring search
    Search {
        /// Query text
        query: String,
    },
}

pub fn run(action: TaskAction) -> CliResult {
    let mut store = open_store()?;

    match action {
        TaskAction::Create {
            title,
            duration,
            priority,
            calendar,
            date,
            time,
            scope,
            by,
            after,
            repeat,
            every,
            count,
            until,
            no_schedule,
        } => {
            let preference = match (date, by) {
                (Some(date), _) => TimePreference::Fixed {
                    date: parse_day(&date)?,
                    time: time.as_deref().map(parse_hm).transpose()?,
                },
                (None, Some(by)) => TimePreference::Flexible {
                    scope: FlexScope::ByDate {
                        date: parse_day(&by)?,
                    },
                },
                (None, None) => TimePreference::Flexible {
                    scope: parse_scope(scope.as_deref())?,
                },
            };
            let recurrence = repeat
                .as_deref()
                .map(|r| {
                    Ok::<_, Box<dyn std::error::Error>>(RecurrenceRule {
                        frequency: parse_frequency(r)?,
                        interval: every,
                        end: match (count, until) {
                            (Some(count), _) => RecurrenceEnd::Count { count },
                            (None, Some(until)) => RecurrenceEnd::Until {
                                date: parse_day(&until)?,
                            },
                            (None, None) => RecurrenceEnd::Open,
                        },
                    })
                })
                .transpose()?;

            let outcome = store.create(
                TaskRequest {
                    title,
                    duration_minutes: duration,
                    priority: parse_priority(&priority)?,
                    calendar,
                    preference,
                    recurrence,
                    depends_on: after,
                },
                !no_schedule,
                today(),
            )?;
            save_store(&store)?;

            if outcome.created.len() == 1 {
                println!("Task created: {}", outcome.created[0]);
            } else {
                println!("Created {} occurrences:", outcome.created.len());
                for id in &outcome.created {
                    println!("  {id}");
                }
            }
            if let Some(report) = outcome.report {
                for unplaced in &report.unplaced {
                    println!("not placed ({}): {}", unplaced.id, unplaced.reason);
                }
                for id in &report.bumped {
                    println!("bumped: {id}");
                }
            }
        }
        TaskAction::List {
            calendar,
            date,
            unplaced,
            json,
        } => {
            let date = date.as_deref().map(parse_day).transpose()?;
            let filtered: Vec<&Task> = store
                .tasks()
                .iter()
                .filter(|t| calendar.as_deref().map_or(true, |c| t.calendar == c))
                .filter(|t| date.is_none() || t.placed_date() == date)
                .filter(|t| !unplaced || !t.is_placed())
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&filtered)?);
            } else {
                for task in filtered {
                    println!("{}", describe(task));
                }
            }
        }
        TaskAction::Get { id } => match store.get(&id) {
            Some(task) => println!("{}", serde_json::to_string_pretty(task)?),
            None => println!("Task not found: {id}"),
        },
        TaskAction::Update {
            id,
            title,
            duration,
            priority,
            calendar,
            after,
        } => {
            let mut task = store
                .get(&id)
                .ok_or_else(|| format!("Task not found: {id}"))?
                .clone();
            if let Some(t) = title {
                task.title = t;
            }
            if let Some(d) = duration {
                task.duration_minutes = d;
            }
            if let Some(p) = priority {
                task.priority = parse_priority(&p)?;
            }
            if let Some(c) = calendar {
                task.calendar = c;
            }
            if let Some(a) = after {
                task.depends_on = if a.is_empty() { None } else { Some(a) };
            }
            store.update(task.clone())?;
            save_store(&store)?;
            println!("Task updated:");
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TaskAction::Delete { id } => {
            store.delete(&id)?;
            save_store(&store)?;
            println!("Task deleted: {id}");
        }
        TaskAction::Complete { id } => {
            let event = store.toggle_completed(&id, today())?;
            save_store(&store)?;
            let task = store.get(&id).ok_or_else(|| format!("Task not found: {id}"))?;
            println!(
                "Task {}: {}",
                if task.completed { "completed" } else { "reopened" },
                task.title
            );
            if let Some(Event::DayCleared { quip, .. }) = event {
                println!("Day cleared! {quip}");
            }
        }
        TaskAction::Move { id, date, time } => {
            store.move_task(&id, parse_day(&date)?, parse_hm(&time)?, today())?;
            save_store(&store)?;
            println!("Task moved: {id} -> {date} {time}");
        }
        TaskAction::Unschedule { id } => {
            store.unschedule(&id)?;
            save_store(&store)?;
            println!("Task unscheduled: {id}");
        }
        TaskAction::Search { query } => {
            for task in store.search(&query) {
                println!("{}", describe(task));
            }
        }
    }
    Ok(())
}

fn describe(task: &Task) -> String {
    let when = match task.placement {
        Placement::Placed { date, start_minute } => {
            format!("{date} {}", format_hm(start_minute))
        }
        Placement::Unplaced => "unplaced".to_string(),
    };
    let done = if task.completed { "x" } else { " " };
    format!(
        "[{done}] {}  {}  {}min  [{}]  {}",
        task.id, when, task.duration_minutes, task.calendar, task.title
    )
}

fn parse_priority(text: &str) -> Result<Priority, String> {
    match text {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        other => Err(format!("unknown priority: {other}")),
    }
}

fn parse_frequency(text: &str) -> Result<Frequency, String> {
    match text {
        "daily" => Ok(Frequency::Daily),
        "weekly" => Ok(Frequency::Weekly),
        "monthly" => Ok(Frequency::Monthly),
        "weekdays" => Ok(Frequency::Weekdays),
        other => Err(format!("unknown repeat frequency: {other}")),
    }
}

fn parse_scope(text: Option<&str>) -> Result<FlexScope, String> {
    match text {
        None | Some("any") => Ok(FlexScope::AnyTime),
        Some("today") => Ok(FlexScope::Today),
        Some("soon") => Ok(FlexScope::NextTwoDays),
        Some("week") => Ok(FlexScope::ThisWeek),
        Some(other) => Err(format!("unknown scope: {other}")),
    }
}
