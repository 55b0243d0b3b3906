//! Holiday listing.

use chaoscontrol_core::holidays::holidays_for;
use chrono::Datelike;

use crate::common::{today, CliResult};

pub fn run(year: Option<i32>) -> CliResult {
    let year = year.unwrap_or_else(|| today().year());
    for day in holidays_for(year) {
        println!("{} {}", day, day.format("%A"));
    }
    Ok(())
}
