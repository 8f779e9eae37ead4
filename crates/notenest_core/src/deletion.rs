//! Deferred delete with undo.
//!
//! # Responsibility
//! - Remove notes from the view immediately while keeping the store row
//!   until a grace deadline passes or the deletion is confirmed.
//! - Restore removed notes at their original positions on undo.
//!
//! # Invariants
//! - State moves `Visible -> ProvisionallyRemoved -> Committed | Restored`
//!   and never leaves a terminal state.
//! - Undo never touches the store; commit never touches the view.
//! - At most one deletion is pending per tracker; a new gesture commits
//!   the previous one first (the affordance was superseded).
//! - A failed or zero-row store delete is reported, never resurrected.

use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::NoteRepository;
use crate::view::{NoteView, ViewEvent};
use chrono::{Duration, NaiveDateTime};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lifecycle of one deletion gesture.
///
/// A `PendingDeletion` starts at `ProvisionallyRemoved`; `Visible` is what
/// `DeletionTracker::state_of` reports for a note no gesture holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionState {
    Visible,
    ProvisionallyRemoved { deadline: NaiveDateTime },
    Committed(CommitReport),
    Restored,
}

impl DeletionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::ProvisionallyRemoved { .. } => "provisionally_removed",
            Self::Committed(_) => "committed",
            Self::Restored => "restored",
        }
    }
}

/// Why a pending deletion was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitReason {
    /// Grace deadline elapsed.
    Timeout,
    /// Caller confirmed explicitly.
    Confirmed,
    /// A newer deletion gesture replaced the affordance.
    Superseded,
}

/// Outcome of committing a deletion to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub reason: CommitReason,
    /// Ids whose rows were removed.
    pub deleted: Vec<NoteId>,
    /// Ids for which the store reported zero rows (missing or write failed).
    pub unresolved: Vec<NoteId>,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// One note taken out of the view, with where it used to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedNote {
    pub note: Note,
    pub original_position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionError {
    EmptySelection,
    NotInView(NoteId),
    AlreadyPending(NoteId),
    NothingPending,
    DeadlineOutOfRange {
        grace_ms: i64,
    },
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },
}

impl Display for DeletionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySelection => write!(f, "no notes selected for deletion"),
            Self::NotInView(id) => write!(f, "note {id} is not in the view"),
            Self::AlreadyPending(id) => write!(f, "note {id} is already pending deletion"),
            Self::NothingPending => write!(f, "no deletion is pending"),
            Self::DeadlineOutOfRange { grace_ms } => {
                write!(f, "grace period of {grace_ms}ms puts the deadline out of range")
            }
            Self::InvalidTransition { from, action } => {
                write!(f, "cannot {action} a deletion in state `{from}`")
            }
        }
    }
}

impl Error for DeletionError {}

/// One deletion gesture covering one or more notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    /// Sorted by ascending `original_position`.
    removed: Vec<RemovedNote>,
    state: DeletionState,
}

impl PendingDeletion {
    /// Removes `ids` from `view` and arms `deadline`.
    ///
    /// Positions are recorded against the view as it was before any removal,
    /// so restoring in ascending order rebuilds the original layout.
    ///
    /// # Errors
    /// - `EmptySelection` when `ids` is empty.
    /// - `NotInView` when any id is absent; the view is left untouched.
    pub fn begin(
        view: &mut NoteView,
        ids: &[NoteId],
        deadline: NaiveDateTime,
    ) -> Result<(Self, Vec<ViewEvent>), DeletionError> {
        if ids.is_empty() {
            return Err(DeletionError::EmptySelection);
        }

        let mut positions = Vec::with_capacity(ids.len());
        for id in ids {
            let position = view
                .position_of(*id)
                .ok_or(DeletionError::NotInView(*id))?;
            if !positions.contains(&position) {
                positions.push(position);
            }
        }
        positions.sort_unstable();

        let mut events = Vec::with_capacity(positions.len());
        let mut removed = Vec::with_capacity(positions.len());
        for position in positions.iter().rev() {
            if let Some((note, event)) = view.remove(*position) {
                events.push(event);
                removed.push(RemovedNote {
                    note,
                    original_position: *position,
                });
            }
        }
        removed.reverse();

        let pending = Self {
            removed,
            state: DeletionState::ProvisionallyRemoved { deadline },
        };
        Ok((pending, events))
    }

    pub fn state(&self) -> &DeletionState {
        &self.state
    }

    pub fn removed(&self) -> &[RemovedNote] {
        &self.removed
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.removed.iter().any(|entry| entry.note.id == id)
    }

    pub fn deadline(&self) -> Option<NaiveDateTime> {
        match self.state {
            DeletionState::ProvisionallyRemoved { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Whether the grace deadline has passed at `now`.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Puts every removed note back at its original position.
    pub fn undo(&mut self, view: &mut NoteView) -> Result<Vec<ViewEvent>, DeletionError> {
        self.expect_removed("undo")?;

        let events = self
            .removed
            .iter()
            .map(|entry| view.insert(entry.original_position, entry.note.clone()))
            .collect();
        self.state = DeletionState::Restored;
        Ok(events)
    }

    /// Deletes every removed note from the store.
    pub fn commit<R: NoteRepository + ?Sized>(
        &mut self,
        store: &R,
        reason: CommitReason,
    ) -> Result<CommitReport, DeletionError> {
        self.expect_removed("commit")?;

        let mut report = CommitReport {
            reason,
            deleted: Vec::new(),
            unresolved: Vec::new(),
        };
        for entry in &self.removed {
            if store.delete(entry.note.id) == 0 {
                report.unresolved.push(entry.note.id);
            } else {
                report.deleted.push(entry.note.id);
            }
        }
        self.state = DeletionState::Committed(report.clone());
        Ok(report)
    }

    fn expect_removed(&self, action: &'static str) -> Result<(), DeletionError> {
        match self.state {
            DeletionState::ProvisionallyRemoved { .. } => Ok(()),
            ref other => Err(DeletionError::InvalidTransition {
                from: other.name(),
                action,
            }),
        }
    }
}

/// Single undo affordance: owns at most one pending deletion.
#[derive(Debug)]
pub struct DeletionTracker {
    grace_period: Duration,
    pending: Option<PendingDeletion>,
}

/// Result of starting a deletion gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginOutcome {
    pub events: Vec<ViewEvent>,
    /// Set when an earlier pending deletion was committed to make room.
    pub superseded: Option<CommitReport>,
}

impl DeletionTracker {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            grace_period,
            pending: None,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn pending(&self) -> Option<&PendingDeletion> {
        self.pending.as_ref()
    }

    /// Deletion state of a single note as the tracker sees it.
    pub fn state_of(&self, id: NoteId) -> DeletionState {
        match self.pending.as_ref() {
            Some(pending) if pending.contains(id) => pending.state().clone(),
            _ => DeletionState::Visible,
        }
    }

    /// Provisionally removes `ids`, committing any earlier pending deletion.
    ///
    /// A gesture naming a note that is already pending is rejected and
    /// changes nothing, as is one whose deadline cannot be represented.
    pub fn begin<R: NoteRepository + ?Sized>(
        &mut self,
        view: &mut NoteView,
        ids: &[NoteId],
        now: NaiveDateTime,
        store: &R,
    ) -> Result<BeginOutcome, DeletionError> {
        if ids.is_empty() {
            return Err(DeletionError::EmptySelection);
        }
        if let Some(current) = self.pending.as_ref() {
            if let Some(id) = ids.iter().find(|id| current.contains(**id)) {
                return Err(DeletionError::AlreadyPending(*id));
            }
        }
        if let Some(id) = ids.iter().find(|id| view.position_of(**id).is_none()) {
            return Err(DeletionError::NotInView(*id));
        }
        let deadline = now
            .checked_add_signed(self.grace_period)
            .ok_or(DeletionError::DeadlineOutOfRange {
                grace_ms: self.grace_period.num_milliseconds(),
            })?;

        let superseded = match self.pending.take() {
            Some(mut previous) => Some(finish_commit(
                &mut previous,
                store,
                CommitReason::Superseded,
            )?),
            None => None,
        };

        let (pending, events) = PendingDeletion::begin(view, ids, deadline)?;
        info!(
            "event=delete_pending module=deletion status=ok notes={} grace_ms={}",
            pending.removed().len(),
            self.grace_period.num_milliseconds()
        );
        self.pending = Some(pending);
        Ok(BeginOutcome { events, superseded })
    }

    /// Restores the pending deletion. The grace timer is disarmed in the
    /// same call, so a later `poll` cannot commit it.
    pub fn undo(&mut self, view: &mut NoteView) -> Result<Vec<ViewEvent>, DeletionError> {
        let mut pending = self.pending.take().ok_or(DeletionError::NothingPending)?;
        let events = pending.undo(view)?;
        info!(
            "event=delete_undo module=deletion status=ok notes={}",
            pending.removed().len()
        );
        Ok(events)
    }

    /// Commits the pending deletion now.
    pub fn confirm<R: NoteRepository + ?Sized>(
        &mut self,
        store: &R,
    ) -> Result<CommitReport, DeletionError> {
        let mut pending = self.pending.take().ok_or(DeletionError::NothingPending)?;
        finish_commit(&mut pending, store, CommitReason::Confirmed)
    }

    /// Commits the pending deletion if its deadline has passed at `now`.
    pub fn poll<R: NoteRepository + ?Sized>(
        &mut self,
        now: NaiveDateTime,
        store: &R,
    ) -> Option<CommitReport> {
        if !self.pending.as_ref().is_some_and(|pending| pending.is_due(now)) {
            return None;
        }
        let mut pending = self.pending.take()?;
        finish_commit(&mut pending, store, CommitReason::Timeout).ok()
    }
}

fn finish_commit<R: NoteRepository + ?Sized>(
    pending: &mut PendingDeletion,
    store: &R,
    reason: CommitReason,
) -> Result<CommitReport, DeletionError> {
    let report = pending.commit(store, reason)?;
    if report.is_clean() {
        info!(
            "event=delete_commit module=deletion status=ok reason={:?} deleted={}",
            reason,
            report.deleted.len()
        );
    } else {
        warn!(
            "event=delete_commit module=deletion status=partial reason={:?} deleted={} unresolved={}",
            reason,
            report.deleted.len(),
            report.unresolved.len()
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{CommitReason, DeletionError, DeletionState, DeletionTracker, PendingDeletion};
    use crate::model::note::{Note, NoteId};
    use crate::repo::note_repo::NoteRepository;
    use crate::repo::{RepoError, RepoResult};
    use crate::view::{NoteView, ViewEvent};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::cell::RefCell;

    struct RecordingRepo {
        deleted: RefCell<Vec<NoteId>>,
        fail: bool,
    }

    impl RecordingRepo {
        fn new(fail: bool) -> Self {
            Self {
                deleted: RefCell::new(Vec::new()),
                fail,
            }
        }
    }

    impl NoteRepository for RecordingRepo {
        fn try_insert(&self, _title: &str, _content: &str) -> RepoResult<NoteId> {
            Ok(NoteId::new(1))
        }
        fn try_update(&self, _id: NoteId, _title: &str, _content: &str) -> RepoResult<usize> {
            Ok(1)
        }
        fn try_delete(&self, id: NoteId) -> RepoResult<usize> {
            if self.fail {
                return Err(RepoError::InvalidData("disk full".to_string()));
            }
            self.deleted.borrow_mut().push(id);
            Ok(1)
        }
        fn list_all(&self) -> RepoResult<Vec<Note>> {
            Ok(Vec::new())
        }
        fn get(&self, _id: NoteId) -> RepoResult<Option<Note>> {
            Ok(None)
        }
        fn count(&self) -> RepoResult<u64> {
            Ok(0)
        }
    }

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(8, minute, 0)
            .unwrap()
    }

    fn view_of(ids: &[i64]) -> NoteView {
        let mut view = NoteView::new();
        for id in ids {
            view.push(Note {
                id: NoteId::new(*id),
                title: format!("n{id}"),
                content: String::new(),
                timestamp: "06/01/2024 08:00".to_string(),
            });
        }
        view
    }

    fn ids(view: &NoteView) -> Vec<i64> {
        view.iter().map(|note| note.id.get()).collect()
    }

    #[test]
    fn batch_undo_restores_original_layout() {
        let mut view = view_of(&[1, 2, 3, 4, 5]);
        let (mut pending, events) =
            PendingDeletion::begin(&mut view, &[NoteId::new(4), NoteId::new(2)], at(1)).unwrap();
        assert_eq!(events, vec![ViewEvent::Removed(3), ViewEvent::Removed(1)]);
        assert_eq!(ids(&view), vec![1, 3, 5]);

        let restored = pending.undo(&mut view).unwrap();
        assert_eq!(restored, vec![ViewEvent::Inserted(1), ViewEvent::Inserted(3)]);
        assert_eq!(ids(&view), vec![1, 2, 3, 4, 5]);
        assert_eq!(pending.state(), &DeletionState::Restored);
    }

    #[test]
    fn unknown_id_leaves_view_untouched() {
        let mut view = view_of(&[1, 2]);
        let err = PendingDeletion::begin(&mut view, &[NoteId::new(2), NoteId::new(9)], at(1))
            .unwrap_err();
        assert_eq!(err, DeletionError::NotInView(NoteId::new(9)));
        assert_eq!(ids(&view), vec![1, 2]);
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let repo = RecordingRepo::new(false);
        let mut view = view_of(&[1]);
        let (mut pending, _) = PendingDeletion::begin(&mut view, &[NoteId::new(1)], at(1)).unwrap();
        pending.commit(&repo, CommitReason::Confirmed).unwrap();

        let err = pending.undo(&mut view).unwrap_err();
        assert!(matches!(
            err,
            DeletionError::InvalidTransition {
                from: "committed",
                action: "undo"
            }
        ));
        assert!(view.is_empty());
    }

    #[test]
    fn failed_store_delete_is_reported_not_resurrected() {
        let repo = RecordingRepo::new(true);
        let mut view = view_of(&[1, 2]);
        let (mut pending, _) = PendingDeletion::begin(&mut view, &[NoteId::new(1)], at(1)).unwrap();

        let report = pending.commit(&repo, CommitReason::Timeout).unwrap();
        assert!(!report.is_clean());
        assert_eq!(report.unresolved, vec![NoteId::new(1)]);
        assert_eq!(ids(&view), vec![2]);
    }

    #[test]
    fn due_only_once_deadline_is_reached() {
        let mut view = view_of(&[1]);
        let (pending, _) = PendingDeletion::begin(&mut view, &[NoteId::new(1)], at(5)).unwrap();
        assert!(!pending.is_due(at(4)));
        assert!(pending.is_due(at(5)));
        assert_eq!(pending.deadline(), Some(at(5)));
    }

    #[test]
    fn tracker_reports_visible_until_a_gesture_holds_the_note() {
        let repo = RecordingRepo::new(false);
        let mut view = view_of(&[1, 2]);
        let mut tracker = DeletionTracker::new(Duration::seconds(3));
        assert_eq!(tracker.state_of(NoteId::new(1)), DeletionState::Visible);

        tracker
            .begin(&mut view, &[NoteId::new(1)], at(1), &repo)
            .unwrap();
        let deadline = at(1) + Duration::seconds(3);
        assert_eq!(
            tracker.state_of(NoteId::new(1)),
            DeletionState::ProvisionallyRemoved { deadline }
        );
        assert_eq!(tracker.state_of(NoteId::new(2)), DeletionState::Visible);

        tracker.undo(&mut view).unwrap();
        assert_eq!(tracker.state_of(NoteId::new(1)), DeletionState::Visible);
    }

    #[test]
    fn unrepresentable_deadline_is_rejected_without_side_effects() {
        let repo = RecordingRepo::new(false);
        let mut view = view_of(&[1, 2]);
        let mut tracker = DeletionTracker::new(Duration::seconds(3));
        tracker
            .begin(&mut view, &[NoteId::new(1)], at(1), &repo)
            .unwrap();

        let err = tracker
            .begin(&mut view, &[NoteId::new(2)], NaiveDateTime::MAX, &repo)
            .unwrap_err();
        assert_eq!(err, DeletionError::DeadlineOutOfRange { grace_ms: 3_000 });
        assert_eq!(ids(&view), vec![2]);
        assert!(repo.deleted.borrow().is_empty());
        assert!(tracker.pending().is_some_and(|p| p.contains(NoteId::new(1))));
    }
}
