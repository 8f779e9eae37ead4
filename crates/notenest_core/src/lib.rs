//! Core domain logic for NoteNest.
//! This crate owns note persistence, view reconciliation and deferred delete.

pub mod clock;
pub mod config;
pub mod db;
pub mod deletion;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod session;
pub mod view;

pub use clock::{format_timestamp, parse_timestamp, Clock, ManualClock, SystemClock};
pub use config::{ConfigError, NotesConfig};
pub use db::{DbError, DbResult};
pub use deletion::{
    BeginOutcome, CommitReason, CommitReport, DeletionError, DeletionState, DeletionTracker,
    PendingDeletion, RemovedNote,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Note, NoteDraft, NoteId};
pub use reconcile::{merge, reconcile, ReconcileMode};
pub use repo::note_repo::{NoteRepository, NoteStore};
pub use repo::{RepoError, RepoResult};
pub use session::{NotesSession, SaveOutcome, SaveReport, SessionError};
pub use view::{NoteView, ViewEvent};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
