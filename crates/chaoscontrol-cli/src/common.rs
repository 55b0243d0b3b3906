//! Shared state loading for CLI commands.

use std::path::PathBuf;

use chaoscontrol_core::storage::{self, snapshot};
use chaoscontrol_core::{Settings, TaskStore};
use chrono::{Local, NaiveDate};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn tasks_path() -> Result<PathBuf, std::io::Error> {
    Ok(storage::data_dir()?.join("tasks.json"))
}

/// Load settings from config.toml and tasks from the snapshot file. The
/// config file wins over whatever settings a saved snapshot carries.
pub fn open_store() -> Result<TaskStore, Box<dyn std::error::Error>> {
    let settings = Settings::load(&Settings::default_path()?)?;
    let (mut snap, _) = snapshot::load(&tasks_path()?)?;
    snap.settings = settings;
    Ok(TaskStore::from_snapshot(snap))
}

pub fn save_store(store: &TaskStore) -> CliResult {
    snapshot::save(&store.snapshot(), &tasks_path()?)?;
    Ok(())
}

/// The local calendar day; day boundaries follow the machine's timezone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
