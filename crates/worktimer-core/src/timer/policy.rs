//! Hard cap and hourly reminders for a running session.
//!
//! The policy is fed the ticking elapsed seconds and answers with at most one
//! action per tick. It holds only dedup state; the state machine acts on the
//! answer.

/// Maximum continuous running time before a forced stop.
pub const HARD_CAP_SECS: u64 = 3 * 60 * 60;

/// Interval between "still running" reminders.
pub const REMINDER_INTERVAL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    /// `hours` hour boundaries have been crossed.
    Remind { hours: u64 },
    /// Elapsed time exceeded `HARD_CAP_SECS`.
    ForceStop,
}

#[derive(Debug, Clone, Default)]
pub struct CapAndReminderPolicy {
    last_reminded_hour: u64,
    cap_fired: bool,
}

impl CapAndReminderPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset at the start or end of a running episode. The next episode
    /// reminds again from hour 1.
    pub fn reset(&mut self) {
        self.last_reminded_hour = 0;
        self.cap_fired = false;
    }

    pub fn observe(&mut self, elapsed_seconds: u64) -> Option<PolicyAction> {
        if elapsed_seconds > HARD_CAP_SECS {
            if self.cap_fired {
                return None;
            }
            self.cap_fired = true;
            return Some(PolicyAction::ForceStop);
        }

        let hour = elapsed_seconds / REMINDER_INTERVAL_SECS;
        if hour > self.last_reminded_hour {
            self.last_reminded_hour = hour;
            return Some(PolicyAction::Remind { hours: hour });
        }
        None
    }

    pub fn last_reminded_hour(&self) -> u64 {
        self.last_reminded_hour
    }
}
