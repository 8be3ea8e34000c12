//! Idle auto-pause.
//!
//! The host supplies "seconds since last user input" through [`IdleSignal`];
//! [`IdleMonitor`] turns that into exactly one pause per idle episode.
//!
//! Idle time is counted from whichever is later: the last input, or the
//! moment the current running episode began. A machine that was already idle
//! for an hour when the timer was started does not get paused on the first
//! tick.

use std::sync::atomic::{AtomicU64, Ordering};

/// Inactivity needed before a running session is paused.
pub const IDLE_THRESHOLD_SECS: u64 = 15 * 60;

/// Host capability reporting user inactivity.
pub trait IdleSignal: Send + Sync {
    fn seconds_since_last_input(&self) -> u64;
}

/// For hosts without an input source.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverIdle;

impl IdleSignal for NeverIdle {
    fn seconds_since_last_input(&self) -> u64 {
        0
    }
}

/// Externally driven signal (tests, embedding hosts that push input events).
#[derive(Debug, Default)]
pub struct ManualIdleSignal {
    idle_secs: AtomicU64,
}

impl ManualIdleSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, secs: u64) {
        self.idle_secs.store(secs, Ordering::SeqCst);
    }

    /// Record user input.
    pub fn touch(&self) {
        self.set(0);
    }

    /// Add `secs` of inactivity.
    pub fn advance(&self, secs: u64) {
        self.idle_secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl IdleSignal for ManualIdleSignal {
    fn seconds_since_last_input(&self) -> u64 {
        self.idle_secs.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdleMonitor {
    armed: bool,
    secs_since_arm: u64,
    fired: bool,
}

impl IdleMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A running episode began; idle accounting restarts here.
    pub fn arm(&mut self) {
        self.armed = true;
        self.secs_since_arm = 0;
        self.fired = false;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.fired = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Called once per tick while running. Returns the idle duration when a
    /// pause should fire.
    pub fn observe(&mut self, signal: &dyn IdleSignal) -> Option<u64> {
        if !self.armed {
            return None;
        }
        self.secs_since_arm += 1;
        let idle = signal.seconds_since_last_input().min(self.secs_since_arm);

        if idle < IDLE_THRESHOLD_SECS {
            // Activity ended the episode (or it has not started yet).
            self.fired = false;
            return None;
        }
        if self.fired {
            return None;
        }
        self.fired = true;
        Some(idle)
    }
}
