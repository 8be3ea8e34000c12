//! Time entry model.
//!
//! A `TimeEntry` is one row of the append-only time log. The engine creates
//! entries on `start` and mutates them in place on pause, resume and stop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryOrigin {
    /// Hand-edited through the CRUD layer.
    Manual,
    /// Created by the timer engine.
    Timer,
}

impl EntryOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryOrigin::Manual => "manual",
            EntryOrigin::Timer => "timer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(EntryOrigin::Manual),
            "timer" => Some(EntryOrigin::Timer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub subject_id: String,
    pub activity_id: Option<String>,
    pub label: Option<String>,
    /// Shifted backward on resume so `now - start_time` is the total.
    pub start_time: DateTime<Utc>,
    /// `None` while running.
    pub end_time: Option<DateTime<Utc>>,
    /// `None` while running; authoritative once closed.
    pub elapsed_seconds: Option<i64>,
    pub paused: bool,
    pub origin: EntryOrigin,
    pub created_at: DateTime<Utc>,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }

    /// Closed but resumable.
    pub fn is_paused(&self) -> bool {
        self.paused && self.end_time.is_some()
    }

    /// Elapsed seconds as of `now`: stored value when closed, derived while running.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> i64 {
        match self.elapsed_seconds {
            Some(secs) if !self.is_running() => secs,
            _ => seconds_between(self.start_time, now),
        }
    }
}

/// Whole seconds from `from` to `to`, clamped at zero.
pub fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().max(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
}

/// Result of `get_active`: the current singleton session, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub status: SessionStatus,
    pub entry: Option<TimeEntry>,
}

impl ActiveSession {
    pub fn idle() -> Self {
        Self {
            status: SessionStatus::Idle,
            entry: None,
        }
    }

    pub fn running(entry: TimeEntry) -> Self {
        Self {
            status: SessionStatus::Running,
            entry: Some(entry),
        }
    }

    pub fn paused(entry: TimeEntry) -> Self {
        Self {
            status: SessionStatus::Paused,
            entry: Some(entry),
        }
    }
}
