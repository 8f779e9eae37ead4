//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register additive schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Every step is safe to re-run against a schema that already has it.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - A downgrade request applies nothing.

use crate::clock::{format_timestamp, Clock};
use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Clone, Copy)]
struct Migration {
    version: u32,
    apply: fn(&Transaction<'_>, &dyn Clock) -> DbResult<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        apply: create_notes_table,
    },
    Migration {
        version: 2,
        apply: add_timestamp_column,
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection, clock: &dyn Clock) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    migrate(conn, current_version, latest_version(), clock)
}

/// Migrates the schema from `old_version` up to `new_version`.
///
/// Steps with `old_version < version <= new_version` run in order inside one
/// transaction. Re-running on an already migrated schema is a no-op apart
/// from rewriting `user_version`.
///
/// # Errors
/// - `DbError::SchemaDowngrade` when `old_version > new_version`; nothing is
///   applied in that case.
/// - `DbError::Sqlite` when any step fails; the transaction is rolled back.
pub fn migrate(
    conn: &mut Connection,
    old_version: u32,
    new_version: u32,
    clock: &dyn Clock,
) -> DbResult<()> {
    if old_version > new_version {
        error!(
            "event=db_migrate module=db status=error error_code=schema_downgrade from={} to={}",
            old_version, new_version
        );
        return Err(DbError::SchemaDowngrade {
            db_version: old_version,
            latest_supported: new_version,
        });
    }

    if old_version == new_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= old_version || migration.version > new_version {
            continue;
        }

        (migration.apply)(&tx, clock)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from={} to={}",
        old_version, new_version
    );
    Ok(())
}

fn create_notes_table(tx: &Transaction<'_>, _clock: &dyn Clock) -> DbResult<()> {
    tx.execute_batch(include_str!("0001_notes.sql"))?;
    Ok(())
}

// Rows that predate the column get the migration-time clock value.
fn add_timestamp_column(tx: &Transaction<'_>, clock: &dyn Clock) -> DbResult<()> {
    if !table_has_column(tx, "notes", "timestamp")? {
        tx.execute_batch("ALTER TABLE notes ADD COLUMN timestamp TEXT;")?;
    }
    tx.execute(
        "UPDATE notes SET timestamp = ?1 WHERE timestamp IS NULL;",
        [format_timestamp(clock.now())],
    )?;
    Ok(())
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
