//! Durable time entry log and the single-session invariant.
//!
//! Every mutating operation runs inside one `BEGIN IMMEDIATE` transaction
//! that reads the current running/paused row and then mutates it, so two
//! callers (threads, or processes sharing the file) never both observe "no
//! running entry". The schema backs this up with partial unique indexes.
//!
//! ## Pause/resume arithmetic
//!
//! ```text
//! start  t=0    start_time=0   end=None  elapsed=None
//! pause  t=100  start_time=0   end=100   elapsed=100  paused
//! resume t=200  start_time=100 end=None  elapsed=None
//! stop   t=250  start_time=100 end=250   elapsed=150
//! ```
//!
//! Resume shifts `start_time` back by the accumulated elapsed time, so
//! `now - start_time` is always the session total without a separate counter.

use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::database::{from_db_time, to_db_time};
use super::{registry, Config, Database};
use crate::entry::{seconds_between, ActiveSession, EntryOrigin, TimeEntry};
use crate::error::{CoreError, DatabaseError, TimerError};
use crate::timer::{Clock, SystemClock};

/// Operations the timer state machine needs from the ground-truth store.
pub trait EntryStore: Send + Sync {
    /// Close any running entry and open a new one.
    fn start(
        &self,
        subject_id: &str,
        activity_id: Option<&str>,
        label: Option<&str>,
    ) -> Result<TimeEntry, TimerError>;

    /// Close the running entry, or finalize the paused one.
    fn stop(&self) -> Result<TimeEntry, TimerError>;

    fn pause(&self) -> Result<TimeEntry, TimerError>;

    fn resume(&self) -> Result<TimeEntry, TimerError>;

    fn get_active(&self) -> Result<ActiveSession, TimerError>;
}

const ENTRY_COLUMNS: &str = "id, subject_id, activity_id, label, start_time, end_time, \
                             elapsed_seconds, paused, origin, created_at";

/// SQLite-backed `EntryStore`.
pub struct TimeEntryStore {
    db: Mutex<Database>,
    clock: Arc<dyn Clock>,
}

impl TimeEntryStore {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            db: Mutex::new(db),
            clock,
        }
    }

    /// Open the configured database with the system clock.
    pub fn open(config: &Config) -> Result<Self, CoreError> {
        Ok(Self::new(Database::open(config)?, Arc::new(SystemClock)))
    }

    pub fn open_at(path: &Path, clock: Arc<dyn Clock>) -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::open_at(path)?, clock))
    }

    pub fn open_memory(clock: Arc<dyn Clock>) -> Result<Self, DatabaseError> {
        Ok(Self::new(Database::open_memory()?, clock))
    }

    pub fn register_subject(&self, id: &str, name: &str) -> Result<(), TimerError> {
        self.write(|conn, now| registry::upsert_subject(conn, id, name, now))
    }

    pub fn register_activity(
        &self,
        id: &str,
        subject_id: &str,
        name: &str,
    ) -> Result<(), TimerError> {
        self.write(|conn, now| registry::upsert_activity(conn, id, subject_id, name, now))
    }

    pub fn entry(&self, id: &str) -> Result<Option<TimeEntry>, TimerError> {
        self.read(|conn| find_entry(conn, id))
    }

    /// Newest entries first, by insertion time.
    pub fn recent_entries(&self, limit: usize) -> Result<Vec<TimeEntry>, TimerError> {
        self.read(|conn| {
            let sql = format!(
                "SELECT {ENTRY_COLUMNS} FROM time_entries
                 ORDER BY created_at DESC, rowid DESC LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit as i64], entry_from_row)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Run `f` inside an immediate (write-locking) transaction, reading the
    /// clock only once the lock is held.
    fn write<T>(
        &self,
        f: impl FnOnce(&Connection, DateTime<Utc>) -> Result<T, TimerError>,
    ) -> Result<T, TimerError> {
        let mut db = self.lock()?;
        let tx = db
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now = self.clock.now();
        let out = f(&tx, now)?;
        tx.commit()?;
        Ok(out)
    }

    /// Run `f` inside a deferred transaction for a consistent read.
    fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T, TimerError>) -> Result<T, TimerError> {
        let mut db = self.lock()?;
        let tx = db
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Deferred)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Database>, TimerError> {
        self.db
            .lock()
            .map_err(|_| TimerError::StoreUnavailable("database lock poisoned".into()))
    }
}

impl EntryStore for TimeEntryStore {
    fn start(
        &self,
        subject_id: &str,
        activity_id: Option<&str>,
        label: Option<&str>,
    ) -> Result<TimeEntry, TimerError> {
        let label = label.map(str::trim).filter(|l| !l.is_empty());
        self.write(|conn, now| {
            registry::resolve(conn, subject_id, activity_id)?;

            if let Some(running) = running_entry(conn)? {
                if close_entry(conn, &running, now, false)? {
                    tracing::info!(
                        entry_id = %running.id,
                        elapsed_seconds = seconds_between(running.start_time, now),
                        "closed running entry before start"
                    );
                } else {
                    tracing::debug!(entry_id = %running.id, "running entry already closed");
                }
            }

            let cleared = conn.execute("UPDATE time_entries SET paused = 0 WHERE paused = 1", [])?;
            if cleared > 0 {
                tracing::debug!(cleared, "finalized paused entries on start");
            }

            let entry = TimeEntry {
                id: Uuid::new_v4().to_string(),
                subject_id: subject_id.to_string(),
                activity_id: activity_id.map(str::to_string),
                label: label.map(str::to_string),
                start_time: now,
                end_time: None,
                elapsed_seconds: None,
                paused: false,
                origin: EntryOrigin::Timer,
                created_at: now,
            };
            conn.execute(
                "INSERT INTO time_entries
                 (id, subject_id, activity_id, label, start_time, paused, origin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
                params![
                    entry.id,
                    entry.subject_id,
                    entry.activity_id,
                    entry.label,
                    to_db_time(entry.start_time),
                    entry.origin.as_str(),
                    to_db_time(entry.created_at),
                ],
            )?;
            tracing::info!(entry_id = %entry.id, subject_id, "started entry");
            Ok(entry)
        })
    }

    fn stop(&self) -> Result<TimeEntry, TimerError> {
        self.write(|conn, now| {
            if let Some(running) = running_entry(conn)? {
                close_entry(conn, &running, now, false)?;
                tracing::info!(entry_id = %running.id, "stopped running entry");
                return load_entry(conn, &running.id);
            }
            if let Some(paused) = latest_paused(conn)? {
                conn.execute(
                    "UPDATE time_entries SET paused = 0 WHERE id = ?1",
                    params![paused.id],
                )?;
                tracing::info!(entry_id = %paused.id, "stopped paused entry");
                return load_entry(conn, &paused.id);
            }
            Err(TimerError::NoActiveSession)
        })
    }

    fn pause(&self) -> Result<TimeEntry, TimerError> {
        self.write(|conn, now| {
            let running = running_entry(conn)?.ok_or(TimerError::NoActiveSession)?;
            close_entry(conn, &running, now, true)?;
            tracing::info!(entry_id = %running.id, "paused entry");
            load_entry(conn, &running.id)
        })
    }

    fn resume(&self) -> Result<TimeEntry, TimerError> {
        self.write(|conn, now| {
            let paused = latest_paused(conn)?.ok_or(TimerError::NoPausedSession)?;
            // Exact span; `elapsed_seconds` is truncated to whole seconds.
            let accumulated = match paused.end_time {
                Some(end) => end - paused.start_time,
                None => Duration::seconds(paused.elapsed_seconds.unwrap_or(0)),
            };
            let start_time = now - accumulated;
            conn.execute(
                "UPDATE time_entries
                 SET start_time = ?1, end_time = NULL, elapsed_seconds = NULL, paused = 0
                 WHERE id = ?2 AND paused = 1",
                params![to_db_time(start_time), paused.id],
            )?;
            tracing::info!(
                entry_id = %paused.id,
                accumulated = accumulated.num_seconds(),
                "resumed entry"
            );
            load_entry(conn, &paused.id)
        })
    }

    fn get_active(&self) -> Result<ActiveSession, TimerError> {
        self.read(|conn| {
            if let Some(running) = running_entry(conn)? {
                return Ok(ActiveSession::running(running));
            }
            Ok(latest_paused(conn)?
                .map(ActiveSession::paused)
                .unwrap_or_else(ActiveSession::idle))
        })
    }
}

// ── Row helpers ──────────────────────────────────────────────────────

fn running_entry(conn: &Connection) -> Result<Option<TimeEntry>, TimerError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries
         WHERE end_time IS NULL ORDER BY start_time DESC LIMIT 1"
    );
    Ok(conn.query_row(&sql, [], entry_from_row).optional()?)
}

/// Most recently closed paused entry.
fn latest_paused(conn: &Connection) -> Result<Option<TimeEntry>, TimerError> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries
         WHERE paused = 1 AND end_time IS NOT NULL
         ORDER BY end_time DESC, rowid DESC LIMIT 1"
    );
    Ok(conn.query_row(&sql, [], entry_from_row).optional()?)
}

fn find_entry(conn: &Connection, id: &str) -> Result<Option<TimeEntry>, TimerError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], entry_from_row).optional()?)
}

fn load_entry(conn: &Connection, id: &str) -> Result<TimeEntry, TimerError> {
    find_entry(conn, id)?
        .ok_or_else(|| TimerError::StoreUnavailable(format!("entry {id} vanished mid-transaction")))
}

/// Close a running entry at `now`. Keyed by id and `end_time IS NULL`, so a
/// second close of the same entry is a no-op; returns whether a row changed.
fn close_entry(
    conn: &Connection,
    entry: &TimeEntry,
    now: DateTime<Utc>,
    paused: bool,
) -> Result<bool, TimerError> {
    let changed = conn.execute(
        "UPDATE time_entries SET end_time = ?1, elapsed_seconds = ?2, paused = ?3
         WHERE id = ?4 AND end_time IS NULL",
        params![
            to_db_time(now),
            seconds_between(entry.start_time, now),
            paused,
            entry.id
        ],
    )?;
    Ok(changed > 0)
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<TimeEntry> {
    let time = |idx: usize| -> rusqlite::Result<DateTime<Utc>> {
        let raw: String = row.get(idx)?;
        from_db_time(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    };
    let end_time = match row.get::<_, Option<String>>(5)? {
        Some(raw) => Some(
            from_db_time(&raw)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        ),
        None => None,
    };
    let origin_raw: String = row.get(8)?;
    let origin = EntryOrigin::parse(&origin_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            8,
            Type::Text,
            format!("unknown origin '{origin_raw}'").into(),
        )
    })?;

    Ok(TimeEntry {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        activity_id: row.get(2)?,
        label: row.get(3)?,
        start_time: time(4)?,
        end_time,
        elapsed_seconds: row.get(6)?,
        paused: row.get(7)?,
        origin,
        created_at: time(9)?,
    })
}
