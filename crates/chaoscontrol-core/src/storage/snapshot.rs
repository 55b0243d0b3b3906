//! Full-state JSON snapshots: `{tasks, settings}`.
//!
//! This is both the on-disk persistence format and the export/import
//! payload. Loading is lenient: records that fail shape validation are
//! skipped and counted, never a fatal abort; fields added after a snapshot
//! was written fall back to their serde defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::storage::Settings;
use crate::task::Task;

/// Serialized full state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub settings: Settings,
}

/// What a lenient load did with the input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    /// Task records loaded intact
    pub loaded: usize,
    /// Malformed records dropped
    pub skipped: usize,
}

/// Parse snapshot JSON, dropping malformed task records.
pub fn parse(text: &str) -> Result<(Snapshot, ImportReport)> {
    let root: Value = serde_json::from_str(text)?;

    let settings = root
        .get("settings")
        .cloned()
        .and_then(|v| serde_json::from_value::<Settings>(v).ok())
        .filter(|s| s.validate().is_ok())
        .unwrap_or_default();

    let mut report = ImportReport::default();
    let mut tasks = Vec::new();
    if let Some(items) = root.get("tasks").and_then(Value::as_array) {
        for item in items {
            match serde_json::from_value::<Task>(item.clone()) {
                Ok(task) if task.validate().is_ok() => {
                    report.loaded += 1;
                    tasks.push(task);
                }
                _ => report.skipped += 1,
            }
        }
    }

    Ok((Snapshot { tasks, settings }, report))
}

/// Load a snapshot file; a missing file yields the empty default state.
pub fn load(path: &Path) -> Result<(Snapshot, ImportReport)> {
    if !path.exists() {
        return Ok((Snapshot::default(), ImportReport::default()));
    }
    let text = std::fs::read_to_string(path).map_err(CoreError::Io)?;
    parse(&text)
}

/// Save a snapshot as pretty-printed JSON.
pub fn save(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, text).map_err(CoreError::Io)?;
    Ok(())
}
