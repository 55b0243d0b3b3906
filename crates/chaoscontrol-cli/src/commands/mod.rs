pub mod config;
pub mod data;
pub mod holidays;
pub mod schedule;
pub mod task;
