//! Shared flashcard decks: import, export and reconciliation of local edits
//! against upstream changes.

pub mod collection;
pub mod config;
pub mod deck;
pub mod sync;
