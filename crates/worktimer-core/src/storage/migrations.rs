//! Database schema migrations for worktimer.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: subject registry and the time entry log.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS subjects (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS activities (
            id          TEXT PRIMARY KEY,
            subject_id  TEXT NOT NULL REFERENCES subjects(id),
            name        TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS time_entries (
            id              TEXT PRIMARY KEY,
            subject_id      TEXT NOT NULL REFERENCES subjects(id),
            activity_id     TEXT REFERENCES activities(id),
            label           TEXT,
            start_time      TEXT NOT NULL,
            end_time        TEXT,
            elapsed_seconds INTEGER,
            paused          INTEGER NOT NULL DEFAULT 0,
            origin          TEXT NOT NULL DEFAULT 'timer',
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_activities_subject ON activities(subject_id);
        CREATE INDEX IF NOT EXISTS idx_time_entries_created_at ON time_entries(created_at);
        CREATE INDEX IF NOT EXISTS idx_time_entries_end_time ON time_entries(end_time);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: enforce the singleton session at the schema level.
///
/// - at most one row with `end_time IS NULL` (the running entry)
/// - at most one row with `paused = 1`
///
/// Databases written before this version may hold several paused rows; all
/// but the most recently closed one are finalized first.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "UPDATE time_entries SET paused = 0
         WHERE paused = 1 AND id NOT IN (
             SELECT id FROM time_entries WHERE paused = 1
             ORDER BY end_time DESC, rowid DESC LIMIT 1
         )",
        [],
    )?;

    tx.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_single_running
            ON time_entries((end_time IS NULL)) WHERE end_time IS NULL;
        CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_single_paused
            ON time_entries(paused) WHERE paused = 1;",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn v2_rejects_second_running_row() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn.execute(
            "INSERT INTO subjects (id, created_at) VALUES ('p', '2026-01-01T00:00:00.000000Z')",
            [],
        )
        .unwrap();
        let insert = "INSERT INTO time_entries (id, subject_id, start_time, created_at)
                      VALUES (?1, 'p', '2026-01-01T00:00:00.000000Z', '2026-01-01T00:00:00.000000Z')";
        conn.execute(insert, ["a"]).unwrap();
        assert!(conn.execute(insert, ["b"]).is_err());
    }

    #[test]
    fn v2_keeps_only_latest_paused_row() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO subjects (id, created_at) VALUES ('p', '2026-01-01T00:00:00.000000Z')",
            [],
        )
        .unwrap();
        for (id, end) in [
            ("old", "2026-01-01T01:00:00.000000Z"),
            ("new", "2026-01-01T02:00:00.000000Z"),
        ] {
            conn.execute(
                "INSERT INTO time_entries
                 (id, subject_id, start_time, end_time, elapsed_seconds, paused, created_at)
                 VALUES (?1, 'p', '2026-01-01T00:00:00.000000Z', ?2, 60, 1, '2026-01-01T00:00:00.000000Z')",
                [id, end],
            )
            .unwrap();
        }

        migrate(&conn).unwrap();

        let paused: Vec<String> = conn
            .prepare("SELECT id FROM time_entries WHERE paused = 1")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(paused, vec!["new".to_string()]);
    }
}
