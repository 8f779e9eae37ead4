//! Owned in-memory note list rendered by the presentation layer.
//!
//! # Responsibility
//! - Hold the ordered sequence of notes currently displayable.
//! - Report every mutation as a positional `ViewEvent`.
//!
//! # Invariants
//! - Only the reconciler and the deletion flow mutate a view
//!   (mutators are crate-private).
//! - Every mutator returns exactly the events describing what it did.

use crate::model::note::{Note, NoteId};
use serde::Serialize;

/// Positional change notification for incremental rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum ViewEvent {
    /// A row now exists at this index; later rows shifted down.
    Inserted(usize),
    /// The row at this index was replaced in place.
    Updated(usize),
    /// The row at this index is gone; later rows shifted up.
    Removed(usize),
}

/// Ordered, single-writer list of notes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteView {
    notes: Vec<Note>,
}

impl NoteView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    /// Returns the current index of the note with `id`.
    pub fn position_of(&self, id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub(crate) fn replace(&mut self, index: usize, note: Note) -> ViewEvent {
        self.notes[index] = note;
        ViewEvent::Updated(index)
    }

    pub(crate) fn push(&mut self, note: Note) -> ViewEvent {
        self.notes.push(note);
        ViewEvent::Inserted(self.notes.len() - 1)
    }

    /// Inserts at `index`, clamped to the current length.
    pub(crate) fn insert(&mut self, index: usize, note: Note) -> ViewEvent {
        let index = index.min(self.notes.len());
        self.notes.insert(index, note);
        ViewEvent::Inserted(index)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<(Note, ViewEvent)> {
        if index >= self.notes.len() {
            return None;
        }
        Some((self.notes.remove(index), ViewEvent::Removed(index)))
    }

    /// Drops rows past `len`, last row first.
    pub(crate) fn truncate(&mut self, len: usize) -> Vec<ViewEvent> {
        let mut events = Vec::new();
        while self.notes.len() > len {
            self.notes.pop();
            events.push(ViewEvent::Removed(self.notes.len()));
        }
        events
    }
}

impl<'a> IntoIterator for &'a NoteView {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}
