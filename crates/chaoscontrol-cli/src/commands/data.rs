//! Export and import of the full JSON state.

use std::path::PathBuf;

use clap::Subcommand;

use chaoscontrol_core::storage::snapshot;
use chaoscontrol_core::{Settings, TaskStore};

use crate::common::{open_store, save_store, CliResult};

#[derive(Subcommand)]
pub enum DataAction {
    /// Write the full state to a JSON file (stdout with no path)
    Export {
        /// Output file
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Replace the state from a JSON file; malformed records are skipped
    Import {
        /// Input file
        path: PathBuf,
    },
}

pub fn run(action: DataAction) -> CliResult {
    match action {
        DataAction::Export { path } => {
            let store = open_store()?;
            let snap = store.snapshot();
            match path {
                Some(path) => {
                    snapshot::save(&snap, &path)?;
                    println!("Exported {} tasks to {}", snap.tasks.len(), path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&snap)?),
            }
        }
        DataAction::Import { path } => {
            let text = std::fs::read_to_string(&path)?;
            let (snap, report) = snapshot::parse(&text)?;

            // Imported settings become the new config.
            snap.settings.save(&Settings::default_path()?)?;
            let store = TaskStore::from_snapshot(snap);
            save_store(&store)?;

            println!("Imported {} tasks ({} skipped)", report.loaded, report.skipped);
        }
    }
    Ok(())
}
