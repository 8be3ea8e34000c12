//! User notifications raised by the timer policies.
//!
//! Delivery is someone else's problem: the engine hands a `Notification` to a
//! `NotificationSink` and moves on. Idle and hard-cap notifications are
//! persistent and carry an action; error notifications are dismissible.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::error::TimerError;
use crate::events::TimerAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Reminder,
    IdlePaused,
    HardCapStopped,
    Error,
}

/// Affordance offered alongside a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAction {
    Resume,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub action: Option<NotificationAction>,
    /// Stays until the user acts on it.
    pub persistent: bool,
}

impl Notification {
    pub fn reminder(hours: u64) -> Self {
        let unit = if hours == 1 { "hour" } else { "hours" };
        Self {
            kind: NotificationKind::Reminder,
            message: format!("Timer has been running for {hours} {unit}"),
            action: Some(NotificationAction::Stop),
            persistent: false,
        }
    }

    pub fn idle_paused(idle_seconds: u64) -> Self {
        Self {
            kind: NotificationKind::IdlePaused,
            message: format!(
                "Timer paused after {} minutes of inactivity",
                idle_seconds / 60
            ),
            action: Some(NotificationAction::Resume),
            persistent: true,
        }
    }

    pub fn hard_cap(cap_seconds: u64) -> Self {
        Self {
            kind: NotificationKind::HardCapStopped,
            message: format!(
                "Timer stopped automatically after reaching the {} hour limit",
                cap_seconds / 3600
            ),
            action: None,
            persistent: true,
        }
    }

    pub fn action_failed(action: TimerAction, error: &TimerError) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: format!("Could not {action} timer: {error}"),
            action: None,
            persistent: false,
        }
    }
}

/// "Notify the user" capability.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits notifications through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => tracing::warn!(
                kind = ?notification.kind,
                "{}",
                notification.message
            ),
            _ => tracing::info!(
                kind = ?notification.kind,
                persistent = notification.persistent,
                "{}",
                notification.message
            ),
        }
    }
}

/// Keeps notifications in memory until drained.
#[derive(Debug, Default)]
pub struct MemorySink {
    received: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|n| n.kind == kind)
            .count()
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}
