//! Single-writer notes session.
//!
//! # Responsibility
//! - Own the store, the rendered view and the undo affordance together.
//! - Funnel every view mutation through the reconciler or the deletion
//!   tracker and hand the resulting `ViewEvent`s back to the caller.
//!
//! # Invariants
//! - All mutation goes through `&mut self`; reconciliation and deletion
//!   steps never interleave.
//! - Notes pending deletion are kept out of the view on refresh.
//! - A failed insert never changes the view.

use crate::clock::Clock;
use crate::config::NotesConfig;
use crate::db::DbResult;
use crate::deletion::{
    BeginOutcome, CommitReport, DeletionError, DeletionState, DeletionTracker, PendingDeletion,
};
use crate::model::note::{NoteDraft, NoteId};
use crate::reconcile::{reconcile, ReconcileMode};
use crate::repo::note_repo::{NoteRepository, NoteStore};
use crate::repo::RepoError;
use crate::view::{NoteView, ViewEvent};
use chrono::{Duration, NaiveDateTime};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum SessionError {
    Repo(RepoError),
    Deletion(DeletionError),
    IndexOutOfBounds { index: usize, len: usize },
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Deletion(err) => write!(f, "{err}"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "view index {index} out of bounds (len {len})")
            }
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Deletion(err) => Some(err),
            Self::IndexOutOfBounds { .. } => None,
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DeletionError> for SessionError {
    fn from(value: DeletionError) -> Self {
        Self::Deletion(value)
    }
}

/// What a save did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(NoteId),
    Updated(NoteId),
    /// Update target no longer exists (or the write failed).
    Missing(NoteId),
    /// Insert failed; nothing was written.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub outcome: SaveOutcome,
    pub events: Vec<ViewEvent>,
}

pub struct NotesSession<R: NoteRepository = NoteStore> {
    store: R,
    view: NoteView,
    deletions: DeletionTracker,
    clock: Arc<dyn Clock>,
    mode: ReconcileMode,
}

impl NotesSession<NoteStore> {
    /// Opens the configured store and returns a session with an empty view.
    pub fn open(config: &NotesConfig, clock: Arc<dyn Clock>) -> DbResult<Self> {
        let store = NoteStore::open(&config.db_path, Arc::clone(&clock))?;
        Ok(Self::new(
            store,
            clock,
            config.grace_period(),
            config.reconcile_mode(),
        ))
    }
}

impl<R: NoteRepository> NotesSession<R> {
    pub fn new(
        store: R,
        clock: Arc<dyn Clock>,
        grace_period: Duration,
        mode: ReconcileMode,
    ) -> Self {
        Self {
            store,
            view: NoteView::new(),
            deletions: DeletionTracker::new(grace_period),
            clock,
            mode,
        }
    }

    pub fn view(&self) -> &NoteView {
        &self.view
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn pending(&self) -> Option<&PendingDeletion> {
        self.deletions.pending()
    }

    pub fn deletion_state(&self, id: NoteId) -> DeletionState {
        self.deletions.state_of(id)
    }

    /// Reloads the store and reconciles the view with it.
    pub fn refresh(&mut self) -> Result<Vec<ViewEvent>, SessionError> {
        let mut fresh = self.store.list_all()?;
        if let Some(pending) = self.deletions.pending() {
            fresh.retain(|note| !pending.contains(note.id));
        }
        Ok(reconcile(&mut self.view, fresh, self.mode))
    }

    /// Creates or updates a note from editor output, then refreshes.
    pub fn save(&mut self, draft: &NoteDraft) -> Result<SaveReport, SessionError> {
        let outcome = if draft.is_new() {
            let id = self
                .store
                .insert(draft.title.as_str(), draft.content.as_str());
            if id.is_persisted() {
                SaveOutcome::Created(id)
            } else {
                SaveOutcome::Rejected
            }
        } else if self
            .store
            .update(draft.id, draft.title.as_str(), draft.content.as_str())
            > 0
        {
            SaveOutcome::Updated(draft.id)
        } else {
            SaveOutcome::Missing(draft.id)
        };

        let events = match outcome {
            SaveOutcome::Rejected => {
                warn!("event=note_save module=session status=rejected");
                Vec::new()
            }
            _ => self.refresh()?,
        };
        info!(
            "event=note_save module=session status=ok outcome={:?} events={}",
            outcome,
            events.len()
        );
        Ok(SaveReport { outcome, events })
    }

    /// Provisionally deletes the note rendered at `index`.
    pub fn delete_at(&mut self, index: usize) -> Result<BeginOutcome, SessionError> {
        let id = self
            .view
            .get(index)
            .map(|note| note.id)
            .ok_or(SessionError::IndexOutOfBounds {
                index,
                len: self.view.len(),
            })?;
        self.delete_ids(&[id])
    }

    /// Provisionally deletes every note in `ids` as one undoable gesture.
    pub fn delete_ids(&mut self, ids: &[NoteId]) -> Result<BeginOutcome, SessionError> {
        let now = self.clock.now();
        let outcome = self
            .deletions
            .begin(&mut self.view, ids, now, &self.store)?;
        Ok(outcome)
    }

    /// Restores the pending deletion at its original positions.
    pub fn undo(&mut self) -> Result<Vec<ViewEvent>, SessionError> {
        Ok(self.deletions.undo(&mut self.view)?)
    }

    /// Commits the pending deletion immediately.
    pub fn confirm_delete(&mut self) -> Result<CommitReport, SessionError> {
        Ok(self.deletions.confirm(&self.store)?)
    }

    /// Commits the pending deletion if its grace period has elapsed.
    pub fn poll(&mut self) -> Option<CommitReport> {
        let now = self.clock.now();
        self.poll_at(now)
    }

    pub fn poll_at(&mut self, now: NaiveDateTime) -> Option<CommitReport> {
        self.deletions.poll(now, &self.store)
    }

    /// Ends the session; a still-pending deletion is committed.
    pub fn close(mut self) -> Option<CommitReport> {
        if self.deletions.pending().is_none() {
            return None;
        }
        self.deletions.confirm(&self.store).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::NotesSession;
    use crate::repo::note_repo::NoteStore;

    fn assert_send<T: Send>() {}

    #[test]
    fn session_can_move_to_a_worker_thread() {
        assert_send::<NotesSession<NoteStore>>();
    }
}
