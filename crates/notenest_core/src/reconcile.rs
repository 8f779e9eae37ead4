//! View reconciliation against freshly listed store contents.
//!
//! # Responsibility
//! - Bring a `NoteView` in line with `list_all()` output with the fewest
//!   positional changes.
//!
//! # Invariants
//! - Rows already equal at the same index are never touched or reordered.
//! - A differing row at an in-bounds index is replaced in place, never
//!   removed and re-inserted.
//! - `ReconcileMode::Extend` never removes rows; trailing stale rows stay
//!   until a caller mirrors or truncates.

use crate::model::note::Note;
use crate::view::{NoteView, ViewEvent};
use log::debug;

/// How to treat view rows past the end of the fresh list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Add and update only. Trailing rows are left in place.
    #[default]
    Extend,
    /// Add, update, then drop trailing rows so the view equals the list.
    Mirror,
}

/// Reconciles `view` in place with `fresh` and returns the emitted events.
pub fn reconcile(view: &mut NoteView, fresh: Vec<Note>, mode: ReconcileMode) -> Vec<ViewEvent> {
    let fresh_len = fresh.len();
    let mut events = Vec::with_capacity(fresh_len);

    if view.is_empty() {
        for note in fresh {
            events.push(view.push(note));
        }
        debug!(
            "event=view_reconcile module=reconcile status=ok kind=bulk inserted={}",
            events.len()
        );
        return events;
    }

    for (index, note) in fresh.into_iter().enumerate() {
        match view.get(index) {
            Some(current) if *current == note => {}
            Some(_) => events.push(view.replace(index, note)),
            None => events.push(view.push(note)),
        }
    }

    if mode == ReconcileMode::Mirror {
        events.extend(view.truncate(fresh_len));
    }

    debug!(
        "event=view_reconcile module=reconcile status=ok kind=diff mode={:?} events={} stale={}",
        mode,
        events.len(),
        view.len().saturating_sub(fresh_len)
    );
    events
}

/// Pure form of [`reconcile`]: returns the merged list and its events.
pub fn merge(view: &[Note], fresh: &[Note], mode: ReconcileMode) -> (Vec<Note>, Vec<ViewEvent>) {
    let mut working = NoteView::new();
    for note in view {
        working.push(note.clone());
    }
    let events = reconcile(&mut working, fresh.to_vec(), mode);
    (working.notes().to_vec(), events)
}

#[cfg(test)]
mod tests {
    use super::{merge, ReconcileMode};
    use crate::model::note::{Note, NoteId};
    use crate::view::ViewEvent;

    fn note(id: i64, title: &str) -> Note {
        Note {
            id: NoteId::new(id),
            title: title.to_string(),
            content: String::new(),
            timestamp: "05/01/2024 12:00".to_string(),
        }
    }

    #[test]
    fn identical_lists_produce_no_events() {
        let rows = vec![note(1, "a"), note(2, "b")];
        let (merged, events) = merge(&rows, &rows, ReconcileMode::Extend);
        assert_eq!(merged, rows);
        assert!(events.is_empty());
    }

    #[test]
    fn growth_appends_past_the_old_end() {
        let view = vec![note(1, "a")];
        let fresh = vec![note(1, "a"), note(2, "b"), note(3, "c")];
        let (merged, events) = merge(&view, &fresh, ReconcileMode::Extend);
        assert_eq!(merged, fresh);
        assert_eq!(events, vec![ViewEvent::Inserted(1), ViewEvent::Inserted(2)]);
    }

    #[test]
    fn shifted_rows_become_in_place_updates() {
        let view = vec![note(1, "a"), note(2, "b")];
        let fresh = vec![note(3, "new"), note(1, "a"), note(2, "b")];
        let (merged, events) = merge(&view, &fresh, ReconcileMode::Extend);
        assert_eq!(merged, fresh);
        assert_eq!(
            events,
            vec![
                ViewEvent::Updated(0),
                ViewEvent::Updated(1),
                ViewEvent::Inserted(2)
            ]
        );
    }

    #[test]
    fn extend_keeps_trailing_stale_rows() {
        let view = vec![note(1, "a"), note(2, "b"), note(3, "c")];
        let fresh = vec![note(1, "a")];
        let (merged, events) = merge(&view, &fresh, ReconcileMode::Extend);
        assert_eq!(merged, view);
        assert!(events.is_empty());
    }

    #[test]
    fn mirror_drops_trailing_stale_rows_last_first() {
        let view = vec![note(1, "a"), note(2, "b"), note(3, "c")];
        let fresh = vec![note(1, "a")];
        let (merged, events) = merge(&view, &fresh, ReconcileMode::Mirror);
        assert_eq!(merged, fresh);
        assert_eq!(events, vec![ViewEvent::Removed(2), ViewEvent::Removed(1)]);
    }

    #[test]
    fn mirror_of_empty_fresh_list_clears_the_view() {
        let view = vec![note(1, "a")];
        let (merged, events) = merge(&view, &[], ReconcileMode::Mirror);
        assert!(merged.is_empty());
        assert_eq!(events, vec![ViewEvent::Removed(0)]);
    }
}
