//! Note domain model.
//!
//! # Responsibility
//! - Define the note row as seen by callers.
//! - Define the create/edit draft passed in from the editor.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused.
//! - `timestamp` is written by the store on every create/update.
//! - Equality is structural over all four fields.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    /// Sentinel for "not yet persisted". Also returned by a failed insert.
    pub const UNSAVED: NoteId = NoteId(-1);

    /// Wraps a raw row id.
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw row id.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Whether this id can refer to a stored row.
    pub fn is_persisted(self) -> bool {
        self.0 > 0
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    /// `MM/DD/YYYY HH:MM`, local time of the last create/update.
    pub timestamp: String,
}

/// Editor output: a new note when `id` is `UNSAVED`, an edit otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub id: NoteId,
    pub title: String,
    pub content: String,
}

impl NoteDraft {
    /// Draft for a note that does not exist yet.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: NoteId::UNSAVED,
            title: title.into(),
            content: content.into(),
        }
    }

    /// Draft replacing the title/content of an existing note.
    pub fn edit(id: NoteId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: content.into(),
        }
    }

    /// Returns whether saving this draft creates a row.
    pub fn is_new(&self) -> bool {
        !self.id.is_persisted()
    }
}

impl From<&Note> for NoteDraft {
    fn from(note: &Note) -> Self {
        Self::edit(note.id, note.title.clone(), note.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteDraft, NoteId};

    fn note(title: &str) -> Note {
        Note {
            id: NoteId::new(3),
            title: title.to_string(),
            content: "body".to_string(),
            timestamp: "01/02/2024 10:00".to_string(),
        }
    }

    #[test]
    fn unsaved_sentinel_is_not_persisted() {
        assert!(!NoteId::UNSAVED.is_persisted());
        assert!(!NoteId::new(0).is_persisted());
        assert!(NoteId::new(1).is_persisted());
    }

    #[test]
    fn equality_covers_every_field() {
        let original = note("a");
        let mut changed = original.clone();
        assert_eq!(original, changed);
        changed.timestamp = "01/02/2024 10:01".to_string();
        assert_ne!(original, changed);
    }

    #[test]
    fn draft_from_note_is_an_edit() {
        let draft = NoteDraft::from(&note("a"));
        assert!(!draft.is_new());
        assert_eq!(draft.id, NoteId::new(3));
        assert!(NoteDraft::new("t", "c").is_new());
    }

    #[test]
    fn note_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&note("a")).expect("note should serialize");
        assert!(json.contains("\"id\":3"));
    }
}
