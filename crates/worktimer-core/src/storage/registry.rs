//! Subject/activity registry queries.
//!
//! Subjects and activities belong to the surrounding CRUD layer; the engine
//! only needs to know that an id resolves and which subject owns an activity.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::database::to_db_time;
use crate::error::TimerError;

pub(crate) fn subject_exists(conn: &Connection, id: &str) -> Result<bool, TimerError> {
    let found = conn
        .query_row("SELECT 1 FROM subjects WHERE id = ?1", params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Owning subject of an activity, if the activity exists.
pub(crate) fn activity_subject(conn: &Connection, id: &str) -> Result<Option<String>, TimerError> {
    Ok(conn
        .query_row(
            "SELECT subject_id FROM activities WHERE id = ?1",
            params![id],
            |row| row.get::<_, String>(0),
        )
        .optional()?)
}

/// Check that `subject_id` exists and, if given, that `activity_id` belongs to it.
pub(crate) fn resolve(
    conn: &Connection,
    subject_id: &str,
    activity_id: Option<&str>,
) -> Result<(), TimerError> {
    if !subject_exists(conn, subject_id)? {
        return Err(TimerError::subject(subject_id));
    }
    if let Some(activity_id) = activity_id {
        match activity_subject(conn, activity_id)? {
            Some(owner) if owner == subject_id => {}
            _ => return Err(TimerError::activity(activity_id)),
        }
    }
    Ok(())
}

pub(crate) fn upsert_subject(
    conn: &Connection,
    id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<(), TimerError> {
    conn.execute(
        "INSERT INTO subjects (id, name, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        params![id, name, to_db_time(now)],
    )?;
    Ok(())
}

pub(crate) fn upsert_activity(
    conn: &Connection,
    id: &str,
    subject_id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> Result<(), TimerError> {
    if !subject_exists(conn, subject_id)? {
        return Err(TimerError::subject(subject_id));
    }
    if let Some(owner) = activity_subject(conn, id)? {
        if owner != subject_id {
            return Err(TimerError::activity(id));
        }
    }
    conn.execute(
        "INSERT INTO activities (id, subject_id, name, created_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        params![id, subject_id, name, to_db_time(now)],
    )?;
    Ok(())
}
