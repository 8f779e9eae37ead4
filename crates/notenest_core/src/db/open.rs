//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Reject locations that cannot be written.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Returned connections have proven they can write the database header.

use super::migrations::{apply_migrations, current_user_version};
use super::{DbError, DbResult};
use crate::clock::Clock;
use log::{error, info};
use rusqlite::{Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const MEMORY_LOCATION: &str = ":memory:";

/// Opens (or creates) the notes database file and applies pending migrations.
///
/// # Errors
/// - `DbError::StorageUnavailable` when the file cannot be created, opened
///   or written.
/// - `DbError::SchemaDowngrade` when the file was written by a newer schema.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, clock: &dyn Clock) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let mut conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=storage_unavailable error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(DbError::StorageUnavailable {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };

    finish_open(&mut conn, path.to_path_buf(), clock, started_at, "file")?;
    Ok(conn)
}

/// Opens an in-memory database with the current schema.
pub fn open_db_in_memory(clock: &dyn Clock) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let mut conn = Connection::open_in_memory().map_err(|err| DbError::StorageUnavailable {
        path: PathBuf::from(MEMORY_LOCATION),
        source: err,
    })?;

    finish_open(
        &mut conn,
        PathBuf::from(MEMORY_LOCATION),
        clock,
        started_at,
        "memory",
    )?;
    Ok(conn)
}

fn finish_open(
    conn: &mut Connection,
    path: PathBuf,
    clock: &dyn Clock,
    started_at: Instant,
    mode: &str,
) -> DbResult<()> {
    match bootstrap_connection(conn, clock) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            let err = classify_bootstrap_error(err, path);
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection, clock: &dyn Clock) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn, clock)?;
    probe_writable(conn)?;
    Ok(())
}

// A read-only file still opens; rewriting the header is the cheapest write.
fn probe_writable(conn: &Connection) -> DbResult<()> {
    let version = current_user_version(conn)?;
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))?;
    Ok(())
}

fn classify_bootstrap_error(err: DbError, path: PathBuf) -> DbError {
    match err {
        DbError::Sqlite(source) if is_unwritable(&source) => {
            DbError::StorageUnavailable { path, source }
        }
        other => other,
    }
}

fn is_unwritable(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if matches!(
                inner.code,
                ErrorCode::ReadOnly | ErrorCode::CannotOpen | ErrorCode::PermissionDenied
            )
    )
}

#[cfg(test)]
mod tests {
    use super::{finish_open, open_db};
    use crate::clock::ManualClock;
    use crate::db::DbError;
    use chrono::NaiveDate;
    use rusqlite::{Connection, OpenFlags};
    use std::time::Instant;

    fn clock() -> ManualClock {
        ManualClock::new(
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn read_only_handle_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        drop(open_db(&path, &clock()).unwrap());

        let mut conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
        let err = finish_open(&mut conn, path.clone(), &clock(), Instant::now(), "file")
            .unwrap_err();
        match err {
            DbError::StorageUnavailable { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn writable_file_passes_the_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        drop(open_db(&path, &clock()).unwrap());

        let mut conn = Connection::open(&path).unwrap();
        finish_open(&mut conn, path, &clock(), Instant::now(), "file").unwrap();
    }
}
