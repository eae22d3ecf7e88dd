use std::collections::{BTreeSet, HashSet};

use crate::collection::{Deck, NoteStore, Result, StoreError};
use crate::sync::merge::optional_tag_group;

use super::{DeckPayload, IncomingNote};

/// Serialize every note with a card in `deck`, along with the models they use.
///
/// Each model is included once, in the order notes first reference it. The
/// optional tag groups found on the notes are offered in sorted order.
pub fn export_deck<S: NoteStore>(store: &S, deck: &Deck) -> Result<DeckPayload> {
    let mut payload = DeckPayload::new(deck.id, deck.name.clone());
    let mut seen_models = HashSet::new();
    let mut groups = BTreeSet::new();

    for note in store.notes_in_deck(deck.id)? {
        if seen_models.insert(note.model_uuid) {
            let model = store
                .find_model(note.model_uuid)?
                .ok_or(StoreError::ModelNotFound(note.model_uuid))?;
            payload.note_models.push(model);
        }
        groups.extend(
            note.tags
                .iter()
                .filter_map(|tag| optional_tag_group(tag).map(str::to_string)),
        );
        payload.notes.push(IncomingNote::from(&note));
    }
    payload.optional_tags = groups.into_iter().collect();

    log::info!(
        "Exported deck '{}': {} notes, {} models",
        deck.name,
        payload.notes.len(),
        payload.note_models.len()
    );
    Ok(payload)
}
