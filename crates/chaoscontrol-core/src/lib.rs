//! # Chaos Control Core Library
//!
//! Core business logic for the Chaos Control personal task scheduler. All
//! operations are available through this library; the CLI binary is a thin
//! presentation layer over the same API, and any other embedder (a GUI, a
//! web view) is expected to follow the same pattern: hand the engine plain
//! task records, get updated records and a report back.
//!
//! ## Architecture
//!
//! - **Time Grid**: slot boundaries and local-calendar-day keys
//! - **Holiday Provider**: observed non-working days computed from rules
//! - **Capacity Tracker**: per-day busy/free minutes against a daily ceiling
//! - **Slot Finder**: first-fit gap search with buffers around neighbors
//! - **Recurrence Expander**: repeat rules into concrete dated instances
//! - **Auto-Scheduler**: greedy, deterministic batch placement with bump
//!   logic for mandatory times and a second pass for dependents
//! - **Task Store**: the single owner of the task collection and its
//!   mutation API, persisted as JSON snapshots
//!
//! ## Key Components
//!
//! - [`TaskStore`]: owning collection with the mutation API
//! - [`AutoScheduler`]: batch placement over a task snapshot
//! - [`Settings`]: workday configuration, TOML-persisted
//! - [`Event`]: engine-to-UI signals (placements, bumps, day cleared)

pub mod capacity;
pub mod error;
pub mod events;
pub mod grid;
pub mod holidays;
pub mod recurrence;
pub mod scheduler;
pub mod slot;
pub mod storage;
pub mod store;
pub mod task;

pub use error::{ConfigError, CoreError, PlacementFailure, Result, ValidationError};
pub use events::Event;
pub use recurrence::{Frequency, RecurrenceEnd, RecurrenceRule};
pub use scheduler::{
    AutoScheduler, SchedulePlan, ScheduleReport, ScheduleScope, SchedulerOptions, UnplacedTask,
};
pub use slot::{Direction, Interval};
pub use storage::{ImportReport, Settings, Snapshot};
pub use store::{CreateOutcome, TaskStore};
pub use task::{CalendarFilter, FlexScope, Placement, Priority, Task, TaskRequest, TimePreference};
