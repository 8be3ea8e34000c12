//! Integration tests for the time entry store.
//!
//! These tests exercise the single-running-entry invariant under concurrent
//! callers and random operation sequences, and check that several store
//! handles on one database file share the same ground truth.

use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use worktimer_core::{
    EntryStore, ManualClock, SessionStatus, SystemClock, TimeEntryStore, TimerError,
};

const SUBJECTS: [&str; 3] = ["acme-web", "globex-seo", "initech-app"];

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2026, 7, 6, 9, 0, 0).unwrap())
}

fn seeded(store: &TimeEntryStore) {
    for subject in SUBJECTS {
        store.register_subject(subject, subject).unwrap();
    }
}

fn running_count(store: &TimeEntryStore) -> usize {
    store
        .recent_entries(10_000)
        .unwrap()
        .iter()
        .filter(|e| e.is_running())
        .count()
}

fn paused_count(store: &TimeEntryStore) -> usize {
    store
        .recent_entries(10_000)
        .unwrap()
        .iter()
        .filter(|e| e.is_paused())
        .count()
}

#[test]
fn test_concurrent_starts_leave_one_running_entry() {
    let store = Arc::new(TimeEntryStore::open_memory(Arc::new(SystemClock)).unwrap());
    seeded(&store);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..20 {
                    store.start(SUBJECTS[i % SUBJECTS.len()], None, None).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(running_count(&store), 1);
    assert_eq!(store.recent_entries(10_000).unwrap().len(), 160);
    assert_eq!(store.get_active().unwrap().status, SessionStatus::Running);
}

#[test]
fn test_two_handles_on_one_file_share_the_singleton() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worktimer.db");
    let setup = TimeEntryStore::open_at(&path, Arc::new(SystemClock)).unwrap();
    seeded(&setup);

    let handles: Vec<_> = (0..2)
        .map(|i| {
            let path = path.clone();
            thread::spawn(move || {
                let store = TimeEntryStore::open_at(&path, Arc::new(SystemClock)).unwrap();
                for _ in 0..25 {
                    store.start(SUBJECTS[i], None, None).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(running_count(&setup), 1);
    assert_eq!(setup.recent_entries(10_000).unwrap().len(), 50);
}

#[test]
fn test_pause_in_one_handle_resume_in_another() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worktimer.db");
    let clock = clock();
    let tab_a = TimeEntryStore::open_at(&path, Arc::new(clock.clone())).unwrap();
    let tab_b = TimeEntryStore::open_at(&path, Arc::new(clock.clone())).unwrap();
    seeded(&tab_a);

    let entry = tab_a.start("acme-web", None, None).unwrap();
    clock.advance_secs(100);
    tab_a.pause().unwrap();
    clock.advance_secs(100);

    let resumed = tab_b.resume().unwrap();
    assert_eq!(resumed.id, entry.id);
    assert_eq!(tab_a.resume().unwrap_err(), TimerError::NoPausedSession);

    clock.advance_secs(50);
    let stopped = tab_a.stop().unwrap();
    assert_eq!(stopped.elapsed_seconds, Some(150));
}

#[test]
fn test_round_trip_through_get_active() {
    let clock = clock();
    let store = TimeEntryStore::open_memory(Arc::new(clock.clone())).unwrap();
    seeded(&store);

    let entry = store.start("globex-seo", None, Some("audit")).unwrap();
    let active = store.get_active().unwrap();
    assert_eq!(active.status, SessionStatus::Running);
    assert_eq!(active.entry.unwrap().id, entry.id);

    clock.advance_secs(1);
    store.stop().unwrap();
    let active = store.get_active().unwrap();
    assert_eq!(active.status, SessionStatus::Idle);
    assert!(active.entry.is_none());
}

#[test]
fn test_resume_targets_most_recent_pause_only() {
    let clock = clock();
    let store = TimeEntryStore::open_memory(Arc::new(clock.clone())).unwrap();
    seeded(&store);

    let first = store.start("acme-web", None, None).unwrap();
    clock.advance_secs(10);
    store.pause().unwrap();

    clock.advance_secs(10);
    let second = store.start("globex-seo", None, None).unwrap();
    clock.advance_secs(10);
    store.pause().unwrap();

    clock.advance_secs(10);
    let resumed = store.resume().unwrap();
    assert_eq!(resumed.id, second.id);
    assert!(!store.entry(&first.id).unwrap().unwrap().paused);
    assert_eq!(paused_count(&store), 0);
}

/// Reference model of the singleton session.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Model {
    Idle,
    Running { accumulated: i64, since: i64 },
    Paused { accumulated: i64 },
}

#[derive(Debug, Clone)]
enum Op {
    Start(usize),
    Pause,
    Resume,
    Stop,
    Advance(i64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..SUBJECTS.len()).prop_map(Op::Start),
        Just(Op::Pause),
        Just(Op::Resume),
        Just(Op::Stop),
        (1i64..5_000).prop_map(Op::Advance),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let clock = clock();
        let store = TimeEntryStore::open_memory(Arc::new(clock.clone())).unwrap();
        seeded(&store);
        let mut model = Model::Idle;
        let mut now = 0i64;

        for op in ops {
            match op {
                Op::Advance(secs) => {
                    clock.advance_secs(secs);
                    now += secs;
                }
                Op::Start(i) => {
                    store.start(SUBJECTS[i], None, None).unwrap();
                    model = Model::Running { accumulated: 0, since: now };
                }
                Op::Pause => match model {
                    Model::Running { accumulated, since } => {
                        let entry = store.pause().unwrap();
                        let total = accumulated + now - since;
                        prop_assert_eq!(entry.elapsed_seconds, Some(total));
                        model = Model::Paused { accumulated: total };
                    }
                    _ => prop_assert_eq!(store.pause().unwrap_err(), TimerError::NoActiveSession),
                },
                Op::Resume => match model {
                    Model::Paused { accumulated } => {
                        store.resume().unwrap();
                        model = Model::Running { accumulated, since: now };
                    }
                    _ => prop_assert_eq!(store.resume().unwrap_err(), TimerError::NoPausedSession),
                },
                Op::Stop => match model {
                    Model::Running { accumulated, since } => {
                        let entry = store.stop().unwrap();
                        prop_assert_eq!(entry.elapsed_seconds, Some(accumulated + now - since));
                        model = Model::Idle;
                    }
                    Model::Paused { accumulated } => {
                        let entry = store.stop().unwrap();
                        prop_assert_eq!(entry.elapsed_seconds, Some(accumulated));
                        model = Model::Idle;
                    }
                    Model::Idle => {
                        prop_assert_eq!(store.stop().unwrap_err(), TimerError::NoActiveSession)
                    }
                },
            }

            prop_assert!(running_count(&store) <= 1);
            prop_assert!(paused_count(&store) <= 1);
            let expected = match model {
                Model::Idle => SessionStatus::Idle,
                Model::Running { .. } => SessionStatus::Running,
                Model::Paused { .. } => SessionStatus::Paused,
            };
            prop_assert_eq!(store.get_active().unwrap().status, expected);
        }
    }
}
