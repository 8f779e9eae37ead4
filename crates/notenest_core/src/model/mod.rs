//! Domain model for persisted notes.
//!
//! # Responsibility
//! - Define the note value entity shared by store, view and deletion flow.
//! - Define the editor payload used to create or update a note.
//!
//! # Invariants
//! - A note's identity is its store-assigned `NoteId`.
//! - `NoteId::UNSAVED` never appears in stored rows.

pub mod note;
