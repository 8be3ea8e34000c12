pub mod activity;
pub mod config;
pub mod entries;
pub mod subject;
pub mod timer;

use serde::Serialize;
use worktimer_core::{Config, TimeEntryStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn open_store(config: &Config) -> Result<TimeEntryStore, Box<dyn std::error::Error>> {
    Ok(TimeEntryStore::open(config)?)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
