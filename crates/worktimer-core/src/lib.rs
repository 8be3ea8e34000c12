//! # worktimer Core Library
//!
//! The time-tracking engine behind the agency dashboard: at most one work
//! session accumulates time system-wide, sessions pause and resume without
//! losing or double-counting time, and autonomous policies (idle auto-pause,
//! hard-cap auto-stop, hourly reminders) run on top of a local ticking clock.
//!
//! ## Architecture
//!
//! - **Time Entry Store**: SQLite-backed append-only log of time entries and
//!   the ground truth for the single running session
//! - **Timer State Machine**: optimistic local clock (Idle/Running/Paused)
//!   that calls the store asynchronously and reconciles with its responses
//! - **Policies**: idle monitor and cap/reminder policy, fed by the tick
//! - **Timer Service**: tokio ticker that drives the machine once a second
//!
//! ## Key Components
//!
//! - [`TimeEntryStore`]: durable store, implements [`EntryStore`]
//! - [`TimerStateMachine`]: client-side state machine
//! - [`TimerService`]: ticking wrapper around the machine
//! - [`NotificationSink`]: "notify the user" capability
//! - [`Config`]: application configuration

pub mod entry;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use entry::{ActiveSession, EntryOrigin, SessionStatus, TimeEntry};
pub use error::{ConfigError, CoreError, DatabaseError, ReferenceKind, TimerError};
pub use events::{Event, TimerAction};
pub use notify::{
    LogSink, MemorySink, Notification, NotificationAction, NotificationKind, NotificationSink,
};
pub use storage::{Config, Database, EntryStore, TimeEntryStore};
pub use timer::{
    CapAndReminderPolicy, Clock, IdleMonitor, IdleSignal, ManualClock, SystemClock,
    TimerService, TimerState, TimerStateMachine,
};
