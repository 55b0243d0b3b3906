//! Configuration commands over the TOML settings file.

use clap::Subcommand;

use chaoscontrol_core::grid::{format_hm, parse_hm};
use chaoscontrol_core::Settings;

use crate::common::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the full configuration
    Show,
    /// Get one value
    Get {
        /// Key, e.g. work_start
        key: String,
    },
    /// Set one value
    Set {
        /// Key, e.g. work_start
        key: String,
        /// Value; times as HH:MM, the rest as numbers or true/false
        value: String,
    },
}

pub fn run(action: ConfigAction) -> CliResult {
    let path = Settings::default_path()?;
    let mut settings = Settings::load(&path)?;

    match action {
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigAction::Get { key } => {
            let value = match key.as_str() {
                "work_start" => format_hm(settings.work_start_minute),
                "work_end" => format_hm(settings.work_end_minute),
                "granularity" => settings.slot_granularity_minutes.to_string(),
                "buffer" => settings.buffer_minutes.to_string(),
                "daily_capacity" => match settings.daily_capacity_minutes {
                    Some(cap) => cap.to_string(),
                    None => format!("{} (workday span)", settings.daily_capacity()),
                },
                "week_start" => settings.week_start_day.to_string(),
                "prefer_mornings" => settings.prefer_mornings.to_string(),
                other => return Err(format!("unknown config key: {other}").into()),
            };
            println!("{key} = {value}");
        }
        ConfigAction::Set { key, value } => {
            match key.as_str() {
                "work_start" => settings.work_start_minute = parse_hm(&value)?,
                "work_end" => settings.work_end_minute = parse_hm(&value)?,
                "granularity" => settings.slot_granularity_minutes = value.parse()?,
                "buffer" => settings.buffer_minutes = value.parse()?,
                "daily_capacity" => {
                    settings.daily_capacity_minutes = if value == "none" {
                        None
                    } else {
                        Some(value.parse()?)
                    }
                }
                "week_start" => settings.week_start_day = value.parse()?,
                "prefer_mornings" => settings.prefer_mornings = value.parse()?,
                other => return Err(format!("unknown config key: {other}").into()),
            }
            settings.save(&path)?;
            println!("Config updated: {key} = {value}");
        }
    }
    Ok(())
}
