use chrono::Utc;
use clap::Subcommand;
use worktimer_core::{Config, TimeEntry};

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum EntriesAction {
    /// List recent time entries, newest first
    List {
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: EntriesAction, config: &Config) -> CliResult {
    let store = open_store(config)?;
    match action {
        EntriesAction::List { limit, json } => {
            let entries = store.recent_entries(limit)?;
            if json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("No entries.");
                return Ok(());
            }
            let now = Utc::now();
            for entry in &entries {
                println!("{}", format_entry(entry, now));
            }
        }
    }
    Ok(())
}

fn format_entry(entry: &TimeEntry, now: chrono::DateTime<Utc>) -> String {
    let state = if entry.is_running() {
        "running"
    } else if entry.is_paused() {
        "paused"
    } else {
        "stopped"
    };
    let secs = entry.elapsed_at(now);
    let subject = match &entry.activity_id {
        Some(activity) => format!("{}/{}", entry.subject_id, activity),
        None => entry.subject_id.clone(),
    };
    format!(
        "{}  {:<8} {:>3}:{:02}:{:02}  {}{}",
        entry.start_time.format("%Y-%m-%d %H:%M"),
        state,
        secs / 3600,
        secs % 3600 / 60,
        secs % 60,
        subject,
        entry
            .label
            .as_deref()
            .map(|l| format!("  \"{l}\""))
            .unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use worktimer_core::EntryOrigin;

    #[test]
    fn formats_closed_entry_as_hms() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 15, 0).unwrap();
        let entry = TimeEntry {
            id: "e1".into(),
            subject_id: "acme".into(),
            activity_id: Some("copy".into()),
            label: Some("landing page".into()),
            start_time: start,
            end_time: Some(start),
            elapsed_seconds: Some(3725),
            paused: true,
            origin: EntryOrigin::Timer,
            created_at: start,
        };
        let line = format_entry(&entry, start);
        assert!(line.contains("paused"));
        assert!(line.contains("1:02:05"));
        assert!(line.contains("acme/copy"));
        assert!(line.contains("\"landing page\""));
    }
}
