use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::SessionStatus;

/// User-level timer actions, as dispatched to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    Start,
    Pause,
    Resume,
    Stop,
}

impl std::fmt::Display for TimerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TimerAction::Start => "start",
            TimerAction::Pause => "pause",
            TimerAction::Resume => "resume",
            TimerAction::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// Every state change of the timer produces an Event.
/// Front ends print or forward them; nothing in the engine consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        subject_id: String,
        activity_id: Option<String>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    /// An hour boundary was crossed while running.
    ReminderDue {
        hours: u64,
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    /// The session exceeded the hard cap and was stopped.
    HardCapReached {
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    /// The session was paused after sustained inactivity.
    IdlePaused {
        idle_seconds: u64,
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    /// A store response reseeded the local clock.
    SessionSynced {
        action: TimerAction,
        entry_id: String,
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
    /// The store rejected a start; local state went back to Idle.
    StartRolledBack {
        subject_id: String,
        reason: String,
        at: DateTime<Utc>,
    },
    /// The store rejected an action; local state was kept.
    ActionFailed {
        action: TimerAction,
        reason: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: SessionStatus,
        entry_id: Option<String>,
        subject_id: Option<String>,
        elapsed_seconds: u64,
        at: DateTime<Utc>,
    },
}
