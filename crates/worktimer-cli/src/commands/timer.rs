use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use worktimer_core::timer::NeverIdle;
use worktimer_core::{
    ActiveSession, Config, EntryStore, Event, IdleSignal, LogSink, MemorySink, NotificationSink,
    TimerService, TimerStateMachine,
};

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start tracking a subject, closing any running entry
    Start {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        activity: Option<String>,
        /// Free-text description of the work
        #[arg(long)]
        label: Option<String>,
    },
    /// Pause the running entry
    Pause,
    /// Resume the most recently paused entry
    Resume,
    /// Stop the running or paused entry
    Stop,
    /// Print the active session as JSON
    Status,
    /// Drive the timer with a live tick and print events as JSON lines
    Watch {
        /// Stop watching after this many seconds; otherwise until the timer leaves Running
        #[arg(long)]
        seconds: Option<u64>,
        /// File whose modification time marks the last user input
        #[arg(long)]
        idle_file: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct StatusView {
    #[serde(flatten)]
    session: ActiveSession,
    elapsed_seconds: i64,
}

pub fn run(action: TimerAction, config: &Config) -> CliResult {
    match action {
        TimerAction::Start {
            subject,
            activity,
            label,
        } => {
            let store = open_store(config)?;
            print_json(&store.start(&subject, activity.as_deref(), label.as_deref())?)
        }
        TimerAction::Pause => print_json(&open_store(config)?.pause()?),
        TimerAction::Resume => print_json(&open_store(config)?.resume()?),
        TimerAction::Stop => print_json(&open_store(config)?.stop()?),
        TimerAction::Status => {
            let session = open_store(config)?.get_active()?;
            let now = chrono::Utc::now();
            let elapsed_seconds = session
                .entry
                .as_ref()
                .map(|e| e.elapsed_at(now))
                .unwrap_or(0);
            print_json(&StatusView {
                session,
                elapsed_seconds,
            })
        }
        TimerAction::Watch { seconds, idle_file } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(config, seconds, idle_file))
        }
    }
}

async fn watch(config: &Config, seconds: Option<u64>, idle_file: Option<PathBuf>) -> CliResult {
    let store = Arc::new(open_store(config)?);
    let sink = Arc::new(MemorySink::new());
    let notifier: Arc<dyn NotificationSink> = if config.notifications.enabled {
        sink.clone()
    } else {
        Arc::new(LogSink)
    };
    let idle: Arc<dyn IdleSignal> = match idle_file {
        Some(path) => Arc::new(FileActivitySignal::new(path)),
        None => Arc::new(NeverIdle),
    };
    let machine = TimerStateMachine::new(store, notifier).with_idle_signal(idle);
    let (mut service, mut events) = TimerService::new(machine);

    emit(&service.hydrate().await?)?;
    tracing::info!(?seconds, "watching timer");

    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));
    let mut check = tokio::time::interval(Duration::from_millis(250));
    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                emit(&event)?;
                emit_notifications(&sink)?;
            }
            _ = check.tick() => {
                let done = match deadline {
                    Some(deadline) => Instant::now() >= deadline,
                    None => !service.is_ticking(),
                };
                if done {
                    break;
                }
            }
        }
    }

    let mut remaining = service.shutdown().await;
    while let Ok(event) = events.try_recv() {
        remaining.push(event);
    }
    for line in closing_lines(&remaining, &sink)? {
        println!("{line}");
    }
    emit(&service.snapshot().await)?;
    Ok(())
}

fn emit_notifications(sink: &MemorySink) -> CliResult {
    for notification in sink.drain() {
        emit(&serde_json::json!({ "notification": notification }))?;
    }
    Ok(())
}

/// Output after shutdown: leftover events, then notifications raised while
/// the last store calls settled.
fn closing_lines(events: &[Event], sink: &MemorySink) -> Result<Vec<String>, serde_json::Error> {
    let mut lines = events
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    for notification in sink.drain() {
        lines.push(serde_json::to_string(
            &serde_json::json!({ "notification": notification }),
        )?);
    }
    Ok(lines)
}

/// One compact JSON document per line.
fn emit<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Treats a file's modification time as the moment of last user input.
///
/// A missing or unreadable file counts as fresh activity.
struct FileActivitySignal {
    path: PathBuf,
}

impl FileActivitySignal {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl IdleSignal for FileActivitySignal {
    fn seconds_since_last_input(&self) -> u64 {
        std::fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .map(|idle| idle.as_secs())
            .unwrap_or(0)
    }
}
