//! Client-side timer state machine.
//!
//! The machine keeps a predictive local clock and treats the store as the
//! ground truth. Commands change local state immediately and hand the matching
//! store call to a blocking worker; the caller never waits on the round trip.
//! Store responses come back on a channel and are applied by
//! [`TimerStateMachine::poll_responses`] or [`TimerStateMachine::settle`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle    --start-->            Running
//! Running --pause | idle-->     Paused
//! Running --stop  | hard cap--> Idle
//! Running --start-->            Running (new entry, elapsed reset)
//! Paused  --resume-->           Running
//! Paused  --stop-->             Idle
//! ```
//!
//! Like the rest of the timer, the machine has no thread of its own: the
//! caller invokes [`TimerStateMachine::tick`] about once a second while
//! Running (see `TimerService`). Commands must be issued from within a tokio
//! runtime.
//!
//! ## Failure policy
//!
//! A `start` rejected with `ReferentialError` is rolled back to Idle. Every
//! other failure keeps the visible clock as it is and raises a dismissible
//! notification; the next user action retries implicitly.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::clock::{Clock, SystemClock};
use super::idle::{IdleMonitor, IdleSignal, NeverIdle};
use super::policy::{CapAndReminderPolicy, PolicyAction, HARD_CAP_SECS};
use crate::entry::{ActiveSession, SessionStatus, TimeEntry};
use crate::error::TimerError;
use crate::events::{Event, TimerAction};
use crate::notify::{Notification, NotificationSink};
use crate::storage::EntryStore;

/// Local view of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running {
        base_elapsed: u64,
        /// Local time the current tick run was seeded.
        tick_started_at: DateTime<Utc>,
    },
    Paused {
        base_elapsed: u64,
    },
}

impl TimerState {
    pub fn status(&self) -> SessionStatus {
        match self {
            TimerState::Idle => SessionStatus::Idle,
            TimerState::Running { .. } => SessionStatus::Running,
            TimerState::Paused { .. } => SessionStatus::Paused,
        }
    }

    pub fn elapsed(&self) -> u64 {
        match *self {
            TimerState::Idle => 0,
            TimerState::Running { base_elapsed, .. } | TimerState::Paused { base_elapsed } => {
                base_elapsed
            }
        }
    }
}

/// What the current session is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// `None` until the store confirms the start.
    pub entry_id: Option<String>,
    pub subject_id: String,
    pub activity_id: Option<String>,
    pub label: Option<String>,
}

impl SessionInfo {
    fn from_entry(entry: &TimeEntry) -> Self {
        Self {
            entry_id: Some(entry.id.clone()),
            subject_id: entry.subject_id.clone(),
            activity_id: entry.activity_id.clone(),
            label: entry.label.clone(),
        }
    }
}

#[derive(Debug)]
struct StoreResponse {
    generation: u64,
    action: TimerAction,
    subject_id: Option<String>,
    result: Result<TimeEntry, TimerError>,
}

type StoreCall = Box<dyn FnOnce(&dyn EntryStore) -> Result<TimeEntry, TimerError> + Send>;

pub struct TimerStateMachine {
    store: Arc<dyn EntryStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn NotificationSink>,
    idle_signal: Arc<dyn IdleSignal>,
    idle: IdleMonitor,
    policy: CapAndReminderPolicy,
    state: TimerState,
    session: Option<SessionInfo>,
    /// Bumped on every local transition; stale responses are not applied.
    generation: u64,
    in_flight: usize,
    responses_tx: mpsc::UnboundedSender<StoreResponse>,
    responses_rx: mpsc::UnboundedReceiver<StoreResponse>,
}

impl TimerStateMachine {
    pub fn new(store: Arc<dyn EntryStore>, notifier: Arc<dyn NotificationSink>) -> Self {
        let (responses_tx, responses_rx) = mpsc::unbounded_channel();
        Self {
            store,
            clock: Arc::new(SystemClock),
            notifier,
            idle_signal: Arc::new(NeverIdle),
            idle: IdleMonitor::new(),
            policy: CapAndReminderPolicy::new(),
            state: TimerState::Idle,
            session: None,
            generation: 0,
            in_flight: 0,
            responses_tx,
            responses_rx,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_idle_signal(mut self, signal: Arc<dyn IdleSignal>) -> Self {
        self.idle_signal = signal;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn elapsed(&self) -> u64 {
        self.state.elapsed()
    }

    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    /// Store calls dispatched but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.status(),
            entry_id: self.session.as_ref().and_then(|s| s.entry_id.clone()),
            subject_id: self.session.as_ref().map(|s| s.subject_id.clone()),
            elapsed_seconds: self.elapsed(),
            at: self.clock.now(),
        }
    }

    // ── Hydration ────────────────────────────────────────────────────

    /// Rebuild local state from the store's active session.
    ///
    /// Unlike commands this waits for the store; it is the mount step.
    pub async fn hydrate(&mut self) -> Result<Event, TimerError> {
        let store = Arc::clone(&self.store);
        let active = tokio::task::spawn_blocking(move || store.get_active())
            .await
            .map_err(|e| TimerError::StoreUnavailable(e.to_string()))??;
        self.apply_active(active);
        Ok(self.snapshot())
    }

    fn apply_active(&mut self, active: ActiveSession) {
        self.generation += 1;
        let now = self.clock.now();
        match (active.status, active.entry) {
            (SessionStatus::Running, Some(entry)) => {
                let base_elapsed = entry.elapsed_at(now).max(0) as u64;
                self.session = Some(SessionInfo::from_entry(&entry));
                self.enter_running(base_elapsed, now);
            }
            (SessionStatus::Paused, Some(entry)) => {
                let base_elapsed = entry.elapsed_seconds.unwrap_or(0).max(0) as u64;
                self.session = Some(SessionInfo::from_entry(&entry));
                self.enter_paused(base_elapsed);
            }
            _ => {
                self.session = None;
                self.enter_idle();
            }
        }
        tracing::info!(status = ?self.status(), elapsed = self.elapsed(), "hydrated timer");
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start tracking `subject_id`. Replaces any current session.
    pub fn start(
        &mut self,
        subject_id: &str,
        activity_id: Option<&str>,
        label: Option<&str>,
    ) -> Event {
        let now = self.clock.now();
        self.generation += 1;
        self.session = Some(SessionInfo {
            entry_id: None,
            subject_id: subject_id.to_string(),
            activity_id: activity_id.map(str::to_string),
            label: label.map(str::to_string),
        });
        self.enter_running(0, now);

        let (subject, activity, text) = (
            subject_id.to_string(),
            activity_id.map(str::to_string),
            label.map(str::to_string),
        );
        self.dispatch(
            TimerAction::Start,
            Some(subject_id.to_string()),
            Box::new(move |store: &dyn EntryStore| {
                store.start(&subject, activity.as_deref(), text.as_deref())
            }),
        );

        Event::TimerStarted {
            subject_id: subject_id.to_string(),
            activity_id: activity_id.map(str::to_string),
            at: now,
        }
    }

    pub fn pause(&mut self) -> Result<Event, TimerError> {
        if !self.is_running() {
            return Err(TimerError::NoActiveSession);
        }
        let elapsed = self.elapsed();
        self.generation += 1;
        self.enter_paused(elapsed);
        self.dispatch(
            TimerAction::Pause,
            None,
            Box::new(|store: &dyn EntryStore| store.pause()),
        );
        Ok(Event::TimerPaused {
            elapsed_seconds: elapsed,
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Result<Event, TimerError> {
        let TimerState::Paused { base_elapsed } = self.state else {
            return Err(TimerError::NoPausedSession);
        };
        let now = self.clock.now();
        self.generation += 1;
        self.enter_running(base_elapsed, now);
        self.dispatch(
            TimerAction::Resume,
            None,
            Box::new(|store: &dyn EntryStore| store.resume()),
        );
        Ok(Event::TimerResumed {
            elapsed_seconds: base_elapsed,
            at: now,
        })
    }

    pub fn stop(&mut self) -> Result<Event, TimerError> {
        if self.state == TimerState::Idle {
            return Err(TimerError::NoActiveSession);
        }
        let elapsed = self.elapsed();
        self.generation += 1;
        self.session = None;
        self.enter_idle();
        self.dispatch(
            TimerAction::Stop,
            None,
            Box::new(|store: &dyn EntryStore| store.stop()),
        );
        Ok(Event::TimerStopped {
            elapsed_seconds: elapsed,
            at: self.clock.now(),
        })
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Advance the local clock by one second and run the policies.
    ///
    /// Returns nothing unless Running.
    pub fn tick(&mut self) -> Vec<Event> {
        let TimerState::Running { base_elapsed, .. } = &mut self.state else {
            return Vec::new();
        };
        *base_elapsed += 1;
        let elapsed = *base_elapsed;
        let now = self.clock.now();
        let mut events = Vec::new();

        match self.policy.observe(elapsed) {
            Some(PolicyAction::ForceStop) => {
                tracing::info!(elapsed, "hard cap reached, stopping timer");
                self.notifier.notify(Notification::hard_cap(HARD_CAP_SECS));
                events.push(Event::HardCapReached {
                    elapsed_seconds: elapsed,
                    at: now,
                });
                if let Ok(stopped) = self.stop() {
                    events.push(stopped);
                }
                return events;
            }
            Some(PolicyAction::Remind { hours }) => {
                tracing::debug!(hours, "reminder due");
                self.notifier.notify(Notification::reminder(hours));
                events.push(Event::ReminderDue {
                    hours,
                    elapsed_seconds: elapsed,
                    at: now,
                });
            }
            None => {}
        }

        if let Some(idle_seconds) = self.idle.observe(self.idle_signal.as_ref()) {
            tracing::info!(idle_seconds, elapsed, "idle threshold reached, pausing timer");
            self.notifier.notify(Notification::idle_paused(idle_seconds));
            events.push(Event::IdlePaused {
                idle_seconds,
                elapsed_seconds: elapsed,
                at: now,
            });
            if let Ok(paused) = self.pause() {
                events.push(paused);
            }
        }

        events
    }

    // ── Store responses ──────────────────────────────────────────────

    /// Apply every store response that has already arrived.
    pub fn poll_responses(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(response) = self.responses_rx.try_recv() {
            events.push(self.apply_response(response));
        }
        events
    }

    /// Wait until every dispatched store call has been applied.
    pub async fn settle(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while self.in_flight > 0 {
            match self.responses_rx.recv().await {
                Some(response) => events.push(self.apply_response(response)),
                None => break,
            }
        }
        events
    }

    fn dispatch(&mut self, action: TimerAction, subject_id: Option<String>, call: StoreCall) {
        let store = Arc::clone(&self.store);
        let tx = self.responses_tx.clone();
        let generation = self.generation;
        self.in_flight += 1;
        tracing::debug!(%action, generation, "dispatching store call");

        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || call(store.as_ref()))
                .await
                .unwrap_or_else(|e| Err(TimerError::StoreUnavailable(e.to_string())));
            let _ = tx.send(StoreResponse {
                generation,
                action,
                subject_id,
                result,
            });
        });
    }

    fn apply_response(&mut self, response: StoreResponse) -> Event {
        self.in_flight = self.in_flight.saturating_sub(1);
        let current = response.generation == self.generation;
        let now = self.clock.now();

        match response.result {
            Ok(entry) => {
                if current {
                    self.reconcile(response.action, &entry, now);
                }
                Event::SessionSynced {
                    action: response.action,
                    elapsed_seconds: entry.elapsed_at(now).max(0) as u64,
                    entry_id: entry.id,
                    at: now,
                }
            }
            Err(err) if response.action == TimerAction::Start && err.is_referential() && current => {
                tracing::warn!(error = %err, "start rejected, rolling back");
                self.session = None;
                self.enter_idle();
                self.notifier
                    .notify(Notification::action_failed(TimerAction::Start, &err));
                Event::StartRolledBack {
                    subject_id: response.subject_id.unwrap_or_default(),
                    reason: err.to_string(),
                    at: now,
                }
            }
            Err(err) => {
                tracing::warn!(action = %response.action, error = %err, "store call failed");
                self.notifier
                    .notify(Notification::action_failed(response.action, &err));
                Event::ActionFailed {
                    action: response.action,
                    reason: err.to_string(),
                    at: now,
                }
            }
        }
    }

    /// Reseed the local clock from the server's canonical entry.
    fn reconcile(&mut self, action: TimerAction, entry: &TimeEntry, now: DateTime<Utc>) {
        match (action, &mut self.state) {
            (
                TimerAction::Start | TimerAction::Resume,
                TimerState::Running {
                    base_elapsed,
                    tick_started_at,
                },
            ) => {
                *base_elapsed = entry.elapsed_at(now).max(0) as u64;
                *tick_started_at = now;
                self.session = Some(SessionInfo::from_entry(entry));
            }
            (TimerAction::Pause, TimerState::Paused { base_elapsed }) => {
                if let Some(secs) = entry.elapsed_seconds {
                    *base_elapsed = secs.max(0) as u64;
                }
                self.session = Some(SessionInfo::from_entry(entry));
            }
            _ => {}
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter_running(&mut self, base_elapsed: u64, now: DateTime<Utc>) {
        self.state = TimerState::Running {
            base_elapsed,
            tick_started_at: now,
        };
        self.policy.reset();
        self.idle.arm();
    }

    fn enter_paused(&mut self, base_elapsed: u64) {
        self.state = TimerState::Paused { base_elapsed };
        self.policy.reset();
        self.idle.disarm();
    }

    fn enter_idle(&mut self) {
        self.state = TimerState::Idle;
        self.policy.reset();
        self.idle.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{MemorySink, NotificationKind};
    use crate::storage::TimeEntryStore;
    use crate::timer::idle::{ManualIdleSignal, IDLE_THRESHOLD_SECS};
    use crate::timer::ManualClock;
    use chrono::TimeZone;

    struct Harness {
        machine: TimerStateMachine,
        store: Arc<TimeEntryStore>,
        clock: ManualClock,
        sink: Arc<MemorySink>,
        idle: Arc<ManualIdleSignal>,
    }

    impl Harness {
        fn new() -> Self {
            let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap());
            let store = Arc::new(TimeEntryStore::open_memory(Arc::new(clock.clone())).unwrap());
            store.register_subject("acme-site", "ACME website").unwrap();
            store.register_subject("acme-seo", "ACME SEO").unwrap();
            let sink = Arc::new(MemorySink::new());
            let idle = Arc::new(ManualIdleSignal::new());
            let machine = TimerStateMachine::new(store.clone(), sink.clone())
                .with_clock(Arc::new(clock.clone()))
                .with_idle_signal(idle.clone());
            Self {
                machine,
                store,
                clock,
                sink,
                idle,
            }
        }

        /// `secs` seconds with the user away: clock, idle signal and tick
        /// advance together.
        fn run_secs(&mut self, secs: u64) -> Vec<Event> {
            let mut events = Vec::new();
            for _ in 0..secs {
                self.clock.advance_secs(1);
                self.idle.advance(1);
                events.extend(self.machine.tick());
            }
            events
        }

        /// `secs` seconds with the user at the keyboard.
        fn work_secs(&mut self, secs: u64) -> Vec<Event> {
            let mut events = Vec::new();
            for _ in 0..secs {
                self.clock.advance_secs(1);
                self.idle.touch();
                events.extend(self.machine.tick());
            }
            events
        }
    }

    #[tokio::test]
    async fn start_is_optimistic_then_synced() {
        let mut h = Harness::new();
        let event = h.machine.start("acme-site", None, Some("hero banner"));
        assert!(matches!(event, Event::TimerStarted { .. }));
        assert!(h.machine.is_running());
        assert_eq!(h.machine.session().unwrap().entry_id, None);
        assert_eq!(h.machine.in_flight(), 1);

        let synced = h.machine.settle().await;
        assert!(matches!(
            synced.as_slice(),
            [Event::SessionSynced { action: TimerAction::Start, .. }]
        ));
        let active = h.store.get_active().unwrap();
        assert_eq!(
            h.machine.session().unwrap().entry_id,
            active.entry.map(|e| e.id)
        );
    }

    #[tokio::test]
    async fn unknown_subject_rolls_back_to_idle() {
        let mut h = Harness::new();
        h.machine.start("no-such-project", None, None);
        assert!(h.machine.is_running());

        let events = h.machine.settle().await;
        assert!(matches!(
            events.as_slice(),
            [Event::StartRolledBack { subject_id, .. }] if subject_id == "no-such-project"
        ));
        assert_eq!(h.machine.state(), TimerState::Idle);
        assert!(h.machine.session().is_none());
        assert_eq!(h.sink.count(NotificationKind::Error), 1);
    }

    #[tokio::test]
    async fn failed_resume_keeps_local_clock() {
        let mut h = Harness::new();
        h.machine.start("acme-site", None, None);
        h.machine.settle().await;
        h.run_secs(10);
        h.machine.pause().unwrap();
        h.machine.settle().await;

        // Someone else finalizes the paused entry behind our back.
        h.store.stop().unwrap();

        h.machine.resume().unwrap();
        let events = h.machine.settle().await;
        assert!(matches!(
            events.as_slice(),
            [Event::ActionFailed { action: TimerAction::Resume, .. }]
        ));
        assert!(h.machine.is_running());
        assert_eq!(h.machine.elapsed(), 10);
        assert_eq!(h.sink.count(NotificationKind::Error), 1);
    }

    #[tokio::test]
    async fn invalid_local_transitions_are_rejected_without_store_call() {
        let mut h = Harness::new();
        assert_eq!(h.machine.pause().unwrap_err(), TimerError::NoActiveSession);
        assert_eq!(h.machine.stop().unwrap_err(), TimerError::NoActiveSession);
        assert_eq!(h.machine.resume().unwrap_err(), TimerError::NoPausedSession);
        assert_eq!(h.machine.in_flight(), 0);
    }

    #[tokio::test]
    async fn pause_resume_stop_matches_store_totals() {
        let mut h = Harness::new();
        h.machine.start("acme-site", None, None);
        h.machine.settle().await;

        h.run_secs(100);
        h.machine.pause().unwrap();
        h.machine.settle().await;
        assert_eq!(h.machine.state(), TimerState::Paused { base_elapsed: 100 });

        h.clock.advance_secs(100);
        h.machine.resume().unwrap();
        h.machine.settle().await;
        assert_eq!(h.machine.elapsed(), 100);

        h.run_secs(50);
        assert_eq!(h.machine.elapsed(), 150);
        h.machine.stop().unwrap();
        h.machine.settle().await;

        let entries = h.store.recent_entries(1).unwrap();
        assert_eq!(entries[0].elapsed_seconds, Some(150));
        assert_eq!(h.machine.state(), TimerState::Idle);
    }

    #[tokio::test]
    async fn switching_subject_resets_elapsed() {
        let mut h = Harness::new();
        h.machine.start("acme-site", None, None);
        h.machine.settle().await;
        h.run_secs(30);

        h.machine.start("acme-seo", None, None);
        assert_eq!(h.machine.elapsed(), 0);
        h.machine.settle().await;
        assert_eq!(h.machine.session().unwrap().subject_id, "acme-seo");
        assert_eq!(h.store.recent_entries(2).unwrap()[1].elapsed_seconds, Some(30));
    }

    #[tokio::test]
    async fn reminders_and_hard_cap_fire_once() {
        let mut h = Harness::new();
        h.machine.start("acme-site", None, None);
        h.machine.settle().await;

        let events = h.work_secs(HARD_CAP_SECS + 600);
        let reminders: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                Event::ReminderDue { elapsed_seconds, .. } => Some(*elapsed_seconds),
                _ => None,
            })
            .collect();
        assert_eq!(reminders, vec![3600, 7200, 10_800]);

        let caps: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                Event::HardCapReached { elapsed_seconds, .. } => Some(*elapsed_seconds),
                _ => None,
            })
            .collect();
        assert_eq!(caps, vec![HARD_CAP_SECS + 1]);
        assert_eq!(h.machine.state(), TimerState::Idle);
        assert_eq!(h.sink.count(NotificationKind::HardCapStopped), 1);
        assert_eq!(h.sink.count(NotificationKind::Reminder), 3);

        h.machine.settle().await;
        assert_eq!(h.store.get_active().unwrap().status, SessionStatus::Idle);
    }

    #[tokio::test]
    async fn resumed_episode_reminds_from_hour_one() {
        let mut h = Harness::new();
        h.machine.start("acme-site", None, None);
        h.machine.settle().await;
        h.work_secs(5000);
        assert_eq!(h.sink.count(NotificationKind::Reminder), 1);

        h.machine.pause().unwrap();
        h.machine.settle().await;
        h.machine.resume().unwrap();
        h.machine.settle().await;

        let reminders: Vec<u64> = h
            .work_secs(10)
            .iter()
            .filter_map(|e| match e {
                Event::ReminderDue { hours, .. } => Some(*hours),
                _ => None,
            })
            .collect();
        assert_eq!(reminders, vec![1]);
        assert_eq!(h.sink.count(NotificationKind::Reminder), 2);
    }

    #[tokio::test]
    async fn idle_pauses_once_per_episode() {
        let mut h = Harness::new();
        h.machine.start("acme-site", None, None);
        h.machine.settle().await;

        let events = h.run_secs(IDLE_THRESHOLD_SECS + 300);
        let idle_pauses = events
            .iter()
            .filter(|e| matches!(e, Event::IdlePaused { .. }))
            .count();
        assert_eq!(idle_pauses, 1);
        assert_eq!(
            h.machine.state(),
            TimerState::Paused {
                base_elapsed: IDLE_THRESHOLD_SECS
            }
        );
        h.machine.settle().await;
        assert_eq!(h.store.get_active().unwrap().status, SessionStatus::Paused);

        // User comes back and resumes, then wanders off again.
        h.idle.touch();
        h.machine.resume().unwrap();
        h.machine.settle().await;
        let events = h.run_secs(IDLE_THRESHOLD_SECS * 2);
        let idle_pauses = events
            .iter()
            .filter(|e| matches!(e, Event::IdlePaused { .. }))
            .count();
        assert_eq!(idle_pauses, 1);
        assert_eq!(h.sink.count(NotificationKind::IdlePaused), 2);
    }

    #[tokio::test]
    async fn hydrate_restores_running_session() {
        let mut h = Harness::new();
        h.store.start("acme-seo", None, None).unwrap();
        h.clock.advance_secs(125);
        // Already idle for ages before the page loaded.
        h.idle.set(10 * IDLE_THRESHOLD_SECS);

        let snapshot = h.machine.hydrate().await.unwrap();
        assert!(matches!(
            snapshot,
            Event::StateSnapshot { status: SessionStatus::Running, elapsed_seconds: 125, .. }
        ));
        assert!(h.run_secs(5).is_empty());
        assert!(h.machine.is_running());
    }

    #[tokio::test]
    async fn hydrate_restores_paused_session() {
        let mut h = Harness::new();
        h.store.start("acme-seo", None, None).unwrap();
        h.clock.advance_secs(42);
        h.store.pause().unwrap();
        h.clock.advance_secs(1000);

        h.machine.hydrate().await.unwrap();
        assert_eq!(h.machine.state(), TimerState::Paused { base_elapsed: 42 });
        assert!(h.run_secs(10).is_empty());
    }

    #[tokio::test]
    async fn stale_start_failure_does_not_roll_back_newer_session() {
        let mut h = Harness::new();
        h.machine.start("no-such-project", None, None);
        h.machine.start("acme-site", None, None);
        let events = h.machine.settle().await;
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ActionFailed { action: TimerAction::Start, .. })));
        assert!(h.machine.is_running());
        assert_eq!(h.machine.session().unwrap().subject_id, "acme-site");
    }
}
