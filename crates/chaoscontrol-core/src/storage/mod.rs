mod config;
pub mod snapshot;

pub use config::Settings;
pub use snapshot::{ImportReport, Snapshot};

use std::path::PathBuf;

/// Returns `~/.config/chaoscontrol[-dev]/` based on CHAOSCONTROL_ENV.
///
/// Set CHAOSCONTROL_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CHAOSCONTROL_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("chaoscontrol-dev")
    } else {
        base_dir.join("chaoscontrol")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
