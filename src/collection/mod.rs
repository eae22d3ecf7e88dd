//! Local note collection
//!
//! This module provides:
//! - Notes, note models, cards and decks as stored locally
//! - The `NoteStore` abstraction the sync core writes through
//! - A JSON-file-backed collection implementing it

mod clock;
pub mod models;
mod storage;

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use clock::{Clock, FixedClock, SystemClock};
pub use models::*;
pub use storage::{CollectionStorage, Result, StoreError};

/// Operations the sync core needs from the local store.
///
/// The store is owned by a single thread; implementations are not
/// expected to tolerate concurrent mutation.
pub trait NoteStore {
    /// Look up a note by its external identifier
    fn find_note(&self, guid: Uuid) -> Result<Option<Note>>;

    /// Look up a deck by id
    fn find_deck(&self, deck_id: Uuid) -> Result<Option<Deck>>;

    /// Look up a note model by UUID
    fn find_model(&self, uuid: Uuid) -> Result<Option<NoteModel>>;

    /// Register a model. An already registered UUID is left untouched.
    /// Returns whether the model was newly added.
    fn add_model(&mut self, model: &NoteModel) -> Result<bool>;

    /// Insert a new note, generating one card per template in `deck_id`
    fn create_note(&mut self, note: Note, deck_id: Uuid) -> Result<Note>;

    /// Replace an existing note, including its model binding and cards, in
    /// one write. Either the whole note is stored or nothing changes.
    fn update_note(&mut self, note: &Note) -> Result<()>;

    /// All notes with at least one card in `deck_id`
    fn notes_in_deck(&self, deck_id: Uuid) -> Result<Vec<Note>>;

    /// Current time for modification stamps
    fn now(&self) -> DateTime<Utc>;
}
