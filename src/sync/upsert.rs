//! Commits one incoming note to the store, creating or updating it

use serde::Serialize;
use uuid::Uuid;

use crate::collection::{Note, NoteStore};
use crate::config::ImportConfig;
use crate::deck::IncomingNote;

use super::error::{Result, StoreResultExt, SyncError};
use super::merge::resolve_content;
use super::reconciler::ModelReconciler;

/// What happened to an incoming note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Create or update the note identified by `incoming.guid`.
///
/// All lookups and mapping decisions happen before the store is written,
/// and the resolved note is committed with a single store call. A note
/// rejected for any reason leaves the store untouched.
pub fn upsert_note<S: NoteStore>(
    store: &mut S,
    reconciler: &mut ModelReconciler<'_>,
    incoming: &IncomingNote,
    deck_id: Uuid,
    config: &ImportConfig,
) -> Result<UpsertOutcome> {
    let guid = incoming.guid;
    let model = store
        .find_model(incoming.note_model_uuid)
        .for_note(guid)?
        .ok_or(SyncError::UnknownModel {
            note: guid,
            model: incoming.note_model_uuid,
        })?;

    if incoming.fields.len() != model.fields.len() {
        return Err(SyncError::FieldCountMismatch {
            note: guid,
            model: model.uuid,
            expected: model.fields.len(),
            found: incoming.fields.len(),
        });
    }

    if store.find_deck(deck_id).for_note(guid)?.is_none() {
        return Err(SyncError::UnknownDeck { note: guid, deck: deck_id });
    }

    let Some(local) = store.find_note(guid).for_note(guid)? else {
        log::debug!("Note {} is new", guid);
        let resolved = resolve_content(incoming, None, &model, config);
        let mut note = Note::new(guid, &model, store.now());
        note.fields = resolved.fields;
        note.tags = resolved.tags;
        store.create_note(note, deck_id).for_note(guid)?;
        return Ok(UpsertOutcome::Created);
    };

    log::debug!("Note {} exists, updating", guid);
    let mut note = reconciler.reconcile(&*store, local, &model)?;

    let resolved = resolve_content(incoming, Some(&note), &model, config);
    note.fields = resolved.fields;
    note.tags = resolved.tags;
    note.modified_at = store.now();
    if !config.ignore_deck_movement {
        note.move_cards(deck_id);
    }

    store.update_note(&note).for_note(guid)?;
    Ok(UpsertOutcome::Updated)
}
