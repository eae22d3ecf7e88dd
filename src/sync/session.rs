//! Batch import of a shared deck into the local collection
//!
//! Notes are processed one at a time on the calling thread. A failing note
//! is recorded in the report and the batch moves on; notes committed before
//! a failure stay committed.

use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::collection::{self, NoteStore};
use crate::config::ImportConfig;
use crate::deck::{DeckPayload, IncomingNote};

use super::error::{Result, SyncError};
use super::model_map::{ModelMapCache, ModelResolver};
use super::reconciler::ModelReconciler;
use super::upsert::{upsert_note, UpsertOutcome};

/// A note that could not be imported
#[derive(Debug)]
pub struct NoteFailure {
    pub guid: Uuid,
    pub error: SyncError,
}

/// Result of importing one deck payload
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Models registered in the collection for the first time
    pub models_added: usize,
    pub created: usize,
    pub updated: usize,
    #[serde(skip)]
    pub failures: Vec<NoteFailure>,
    pub duration_ms: u64,
}

impl ImportReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }
}

/// State shared by every note of one import: the store, the immutable
/// config and the model map cache.
pub struct ImportSession<'a, S: NoteStore> {
    store: &'a mut S,
    config: &'a ImportConfig,
    reconciler: ModelReconciler<'a>,
}

impl<'a, S: NoteStore> ImportSession<'a, S> {
    /// A session without a resolver: unseen model transitions fail
    pub fn new(store: &'a mut S, config: &'a ImportConfig) -> Self {
        Self {
            store,
            config,
            reconciler: ModelReconciler::new(),
        }
    }

    pub fn with_resolver(store: &'a mut S, config: &'a ImportConfig, resolver: impl ModelResolver + 'a) -> Self {
        Self {
            store,
            config,
            reconciler: ModelReconciler::with_resolver(resolver),
        }
    }

    pub fn model_maps(&self) -> &ModelMapCache {
        self.reconciler.cache()
    }

    /// Register the payload's models, then upsert each of its notes into `deck_id`.
    ///
    /// Only a failure to register models aborts the batch.
    pub fn import_deck(&mut self, payload: &DeckPayload, deck_id: Uuid) -> collection::Result<ImportReport> {
        let start = Instant::now();
        let mut report = ImportReport::default();

        log::info!(
            "Importing deck '{}' ({}): {} notes, {} models",
            payload.name,
            payload.uuid,
            payload.notes.len(),
            payload.note_models.len()
        );

        for model in &payload.note_models {
            if self.store.add_model(model)? {
                report.models_added += 1;
            }
        }

        for incoming in &payload.notes {
            match self.import_note(incoming, deck_id) {
                Ok(outcome) => report.record(outcome),
                Err(error) => {
                    log::warn!("Skipping note: {}", error);
                    report.failures.push(NoteFailure {
                        guid: incoming.guid,
                        error,
                    });
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "Imported deck '{}': {} created, {} updated, {} failed",
            payload.name,
            report.created,
            report.updated,
            report.failed()
        );
        Ok(report)
    }

    /// Upsert a single note
    pub fn import_note(&mut self, incoming: &IncomingNote, deck_id: Uuid) -> Result<UpsertOutcome> {
        upsert_note(self.store, &mut self.reconciler, incoming, deck_id, self.config)
    }
}
