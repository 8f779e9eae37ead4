//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/delete/list over the `notes` table.
//! - Stamp `timestamp` from the injected clock on every write.
//!
//! # Invariants
//! - Callers never supply timestamps or ids.
//! - `list_all` is ordered by timestamp DESC (chronological), id ASC.
//! - A failed insert leaves no row behind and yields `NoteId::UNSAVED`.

use crate::clock::{format_timestamp, Clock};
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::note::{Note, NoteId};
use crate::repo::{RepoError, RepoResult};
use log::{debug, warn};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Arc;

const NOTE_SELECT_SQL: &str = "SELECT id, title, content, timestamp FROM notes";

// `MM/DD/YYYY HH:MM` does not sort lexically; compare year, month, day, time.
const NOTE_ORDER_SQL: &str = "ORDER BY
    substr(timestamp, 7, 4) DESC,
    substr(timestamp, 1, 2) DESC,
    substr(timestamp, 4, 2) DESC,
    substr(timestamp, 12, 5) DESC,
    id ASC";

/// Repository interface for note CRUD.
///
/// `try_*` methods surface the failure cause. The unprefixed methods are
/// the soft-failure contract: sentinel id or zero count, cause logged.
pub trait NoteRepository {
    /// Inserts a row stamped with the current time and returns its new id.
    fn try_insert(&self, title: &str, content: &str) -> RepoResult<NoteId>;
    /// Overwrites title/content and re-stamps; returns rows affected.
    fn try_update(&self, id: NoteId, title: &str, content: &str) -> RepoResult<usize>;
    /// Removes one row; returns rows affected.
    fn try_delete(&self, id: NoteId) -> RepoResult<usize>;
    /// Returns every note, most recently touched first.
    fn list_all(&self) -> RepoResult<Vec<Note>>;
    /// Gets one note by id.
    fn get(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Returns the number of stored notes.
    fn count(&self) -> RepoResult<u64>;

    /// Inserts a note, returning `NoteId::UNSAVED` on failure.
    fn insert(&self, title: &str, content: &str) -> NoteId {
        match self.try_insert(title, content) {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    "event=note_insert module=repo status=error error_code=write_failed error={}",
                    err
                );
                NoteId::UNSAVED
            }
        }
    }

    /// Updates a note, returning 0 when it is missing or the write failed.
    fn update(&self, id: NoteId, title: &str, content: &str) -> usize {
        match self.try_update(id, title, content) {
            Ok(changed) => changed,
            Err(err) => {
                warn!(
                    "event=note_update module=repo status=error note_id={} error_code=write_failed error={}",
                    id, err
                );
                0
            }
        }
    }

    /// Deletes a note, returning 0 when it is missing or the write failed.
    fn delete(&self, id: NoteId) -> usize {
        match self.try_delete(id) {
            Ok(changed) => changed,
            Err(err) => {
                warn!(
                    "event=note_delete module=repo status=error note_id={} error_code=write_failed error={}",
                    id, err
                );
                0
            }
        }
    }
}

/// SQLite-backed note store.
pub struct NoteStore {
    conn: Connection,
    clock: Arc<dyn Clock>,
}

impl NoteStore {
    /// Opens or creates the store at `path`, migrating it to the current schema.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> DbResult<Self> {
        let conn = open_db(path, clock.as_ref())?;
        Ok(Self { conn, clock })
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory(clock: Arc<dyn Clock>) -> DbResult<Self> {
        let conn = open_db_in_memory(clock.as_ref())?;
        Ok(Self { conn, clock })
    }

    /// Borrows the underlying connection for diagnostics.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn stamp(&self) -> String {
        format_timestamp(self.clock.now())
    }
}

impl NoteRepository for NoteStore {
    fn try_insert(&self, title: &str, content: &str) -> RepoResult<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (title, content, timestamp) VALUES (?1, ?2, ?3);",
            params![title, content, self.stamp()],
        )?;
        let id = NoteId::new(self.conn.last_insert_rowid());
        debug!("event=note_insert module=repo status=ok note_id={}", id);
        Ok(id)
    }

    fn try_update(&self, id: NoteId, title: &str, content: &str) -> RepoResult<usize> {
        if !id.is_persisted() {
            return Ok(0);
        }

        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                timestamp = ?4
             WHERE id = ?1;",
            params![id.get(), title, content, self.stamp()],
        )?;
        debug!(
            "event=note_update module=repo status=ok note_id={} rows={}",
            id, changed
        );
        Ok(changed)
    }

    fn try_delete(&self, id: NoteId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id.get()])?;
        debug!(
            "event=note_delete module=repo status=ok note_id={} rows={}",
            id, changed
        );
        Ok(changed)
    }

    fn list_all(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} {NOTE_ORDER_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn get(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.get()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(row)?));
        }
        Ok(None)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let raw_id: i64 = row.get("id")?;
    let id = NoteId::new(raw_id);
    if !id.is_persisted() {
        return Err(RepoError::InvalidData(format!(
            "invalid id value `{raw_id}` in notes.id"
        )));
    }

    Ok(Note {
        id,
        title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
        content: row.get::<_, Option<String>>("content")?.unwrap_or_default(),
        timestamp: row
            .get::<_, Option<String>>("timestamp")?
            .unwrap_or_default(),
    })
}
