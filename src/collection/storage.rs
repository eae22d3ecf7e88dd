//! File-backed note collection
//!
//! Directory structure:
//! ```text
//! {collection}/
//! ├── decks.json          # Array of all decks
//! ├── models/
//! │   └── {model-uuid}.json
//! └── notes/
//!     └── {note-guid}.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use super::models::*;
use super::NoteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    #[error("Note model not found: {0}")]
    ModelNotFound(Uuid),

    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    #[error("Note already exists: {0}")]
    DuplicateNote(Uuid),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage manager for a local collection directory
pub struct CollectionStorage {
    base_path: PathBuf,
    clock: Box<dyn Clock>,
}

impl CollectionStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self::with_clock(base_path, Box::new(SystemClock))
    }

    pub fn with_clock(base_path: PathBuf, clock: Box<dyn Clock>) -> Self {
        Self { base_path, clock }
    }

    /// Get the default collection directory
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("deckshare").join("collection"))
            .ok_or(StoreError::DataDirNotFound)
    }

    fn decks_path(&self) -> PathBuf {
        self.base_path.join("decks.json")
    }

    fn models_dir(&self) -> PathBuf {
        self.base_path.join("models")
    }

    fn notes_dir(&self) -> PathBuf {
        self.base_path.join("notes")
    }

    fn model_path(&self, uuid: Uuid) -> PathBuf {
        self.models_dir().join(format!("{}.json", uuid))
    }

    fn note_path(&self, guid: Uuid) -> PathBuf {
        self.notes_dir().join(format!("{}.json", guid))
    }

    /// Initialize the collection directories
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.models_dir())?;
        fs::create_dir_all(self.notes_dir())?;

        let decks_path = self.decks_path();
        if !decks_path.exists() {
            let empty_decks: Vec<Deck> = Vec::new();
            fs::write(&decks_path, serde_json::to_string_pretty(&empty_decks)?)?;
        }

        Ok(())
    }

    // ==================== Deck Operations ====================

    /// List all decks in the collection
    pub fn list_decks(&self) -> Result<Vec<Deck>> {
        let decks_path = self.decks_path();
        if !decks_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&decks_path)?;
        let decks: Vec<Deck> = serde_json::from_str(&content)?;
        Ok(decks)
    }

    /// Get a specific deck
    pub fn get_deck(&self, deck_id: Uuid) -> Result<Deck> {
        self.list_decks()?
            .into_iter()
            .find(|d| d.id == deck_id)
            .ok_or(StoreError::DeckNotFound(deck_id))
    }

    /// Find a deck by exact (case-insensitive) name
    pub fn find_deck_by_name(&self, name: &str) -> Result<Option<Deck>> {
        let name_lower = name.to_lowercase();
        Ok(self
            .list_decks()?
            .into_iter()
            .find(|d| d.name.to_lowercase() == name_lower))
    }

    /// Create a new deck
    pub fn create_deck(&self, name: String) -> Result<Deck> {
        self.init()?;

        let deck = Deck::new(name, self.clock.now());
        let mut decks = self.list_decks()?;
        decks.push(deck.clone());
        fs::write(self.decks_path(), serde_json::to_string_pretty(&decks)?)?;

        log::info!("Created deck '{}' ({})", deck.name, deck.id);
        Ok(deck)
    }

    /// Return the deck called `name`, creating it if missing
    pub fn ensure_deck(&self, name: &str) -> Result<Deck> {
        match self.find_deck_by_name(name)? {
            Some(deck) => Ok(deck),
            None => self.create_deck(name.to_string()),
        }
    }

    // ==================== Model Operations ====================

    fn require_model(&self, uuid: Uuid) -> Result<NoteModel> {
        self.find_model(uuid)?.ok_or(StoreError::ModelNotFound(uuid))
    }

    // ==================== Note Operations ====================

    /// List every note in the collection
    pub fn list_notes(&self) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = read_json_dir(&self.notes_dir())?;
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.guid.cmp(&b.guid)));
        Ok(notes)
    }

    /// Write a note through a temporary file so a failed write never
    /// leaves a half-written note behind
    fn write_note(&self, note: &Note) -> Result<()> {
        let path = self.note_path(note.guid);
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(note)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl NoteStore for CollectionStorage {
    fn find_note(&self, guid: Uuid) -> Result<Option<Note>> {
        read_json_file(&self.note_path(guid))
    }

    fn find_deck(&self, deck_id: Uuid) -> Result<Option<Deck>> {
        Ok(self.list_decks()?.into_iter().find(|d| d.id == deck_id))
    }

    fn find_model(&self, uuid: Uuid) -> Result<Option<NoteModel>> {
        read_json_file(&self.model_path(uuid))
    }

    fn add_model(&mut self, model: &NoteModel) -> Result<bool> {
        self.init()?;

        let model_path = self.model_path(model.uuid);
        if model_path.exists() {
            return Ok(false);
        }

        fs::write(&model_path, serde_json::to_string_pretty(model)?)?;
        log::debug!("Registered note model '{}' ({})", model.name, model.uuid);
        Ok(true)
    }

    fn create_note(&mut self, mut note: Note, deck_id: Uuid) -> Result<Note> {
        self.init()?;
        self.get_deck(deck_id)?;

        if self.note_path(note.guid).exists() {
            return Err(StoreError::DuplicateNote(note.guid));
        }

        let model = self.require_model(note.model_uuid)?;
        note.cards = (0..model.templates.len())
            .map(|template| Card { template, deck_id })
            .collect();

        self.write_note(&note)?;
        Ok(note)
    }

    fn update_note(&mut self, note: &Note) -> Result<()> {
        if !self.note_path(note.guid).exists() {
            return Err(StoreError::NoteNotFound(note.guid));
        }

        // Validate everything the note points at before touching the file
        self.require_model(note.model_uuid)?;
        let decks = self.list_decks()?;
        if let Some(card) = note.cards.iter().find(|c| !decks.iter().any(|d| d.id == c.deck_id)) {
            return Err(StoreError::DeckNotFound(card.deck_id));
        }

        self.write_note(note)
    }

    fn notes_in_deck(&self, deck_id: Uuid) -> Result<Vec<Note>> {
        Ok(self
            .list_notes()?
            .into_iter()
            .filter(|note| note.has_card_in(deck_id))
            .collect())
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn read_json_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            let content = fs::read_to_string(&path)?;
            items.push(serde_json::from_str(&content)?);
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::TempDir;

    use super::*;
    use crate::collection::FixedClock;

    fn storage(dir: &TempDir) -> CollectionStorage {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        let storage = CollectionStorage::with_clock(dir.path().to_path_buf(), Box::new(clock));
        storage.init().unwrap();
        storage
    }

    #[test]
    fn test_create_note_generates_card_per_template() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage(&dir);
        let deck = storage.create_deck("Spanish".to_string()).unwrap();
        let model = NoteModel::new("Basic (and reversed)", &["Front", "Back"], &["Card 1", "Card 2"]);
        storage.add_model(&model).unwrap();

        let note = Note::new(Uuid::new_v4(), &model, storage.now());
        let created = storage.create_note(note.clone(), deck.id).unwrap();

        assert_eq!(created.cards.len(), 2);
        assert!(created.cards.iter().all(|c| c.deck_id == deck.id));
        assert_eq!(storage.find_note(note.guid).unwrap(), Some(created));
    }

    #[test]
    fn test_create_note_twice_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage(&dir);
        let deck = storage.create_deck("Deck".to_string()).unwrap();
        let model = NoteModel::new("Basic", &["Front", "Back"], &["Card 1"]);
        storage.add_model(&model).unwrap();

        let note = Note::new(Uuid::new_v4(), &model, storage.now());
        storage.create_note(note.clone(), deck.id).unwrap();

        assert!(matches!(
            storage.create_note(note, deck.id),
            Err(StoreError::DuplicateNote(_))
        ));
    }

    #[test]
    fn test_add_model_keeps_existing_uuid() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage(&dir);
        let model = NoteModel::new("Basic", &["Front", "Back"], &["Card 1"]);

        assert!(storage.add_model(&model).unwrap());

        let mut renamed = model.clone();
        renamed.name = "Renamed".to_string();
        assert!(!storage.add_model(&renamed).unwrap());
        assert_eq!(storage.find_model(model.uuid).unwrap().unwrap().name, "Basic");
    }

    #[test]
    fn test_update_note_rejects_unknown_deck() {
        let dir = TempDir::new().unwrap();
        let mut storage = storage(&dir);
        let deck = storage.create_deck("Deck".to_string()).unwrap();
        let other = storage.create_deck("Other".to_string()).unwrap();
        let model = NoteModel::new("Basic", &["Front", "Back"], &["Card 1"]);
        storage.add_model(&model).unwrap();
        let note = storage
            .create_note(Note::new(Uuid::new_v4(), &model, storage.now()), deck.id)
            .unwrap();

        let mut lost = note.clone();
        lost.fields[0] = "changed".to_string();
        lost.move_cards(Uuid::new_v4());
        assert!(matches!(
            storage.update_note(&lost),
            Err(StoreError::DeckNotFound(_))
        ));
        assert_eq!(storage.find_note(note.guid).unwrap(), Some(note.clone()));

        let mut moved = note.clone();
        moved.move_cards(other.id);
        storage.update_note(&moved).unwrap();
        assert_eq!(storage.notes_in_deck(other.id).unwrap().len(), 1);
        assert!(storage.notes_in_deck(deck.id).unwrap().is_empty());
    }

    #[test]
    fn test_find_deck() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let deck = storage.create_deck("Deck".to_string()).unwrap();

        assert_eq!(storage.find_deck(deck.id).unwrap().map(|d| d.name), Some("Deck".to_string()));
        assert!(storage.find_deck(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_ensure_deck_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let deck = storage.ensure_deck("Japanese").unwrap();

        assert_eq!(storage.ensure_deck("japanese").unwrap().id, deck.id);
        assert_eq!(storage.list_decks().unwrap().len(), 1);
    }
}
