//! Moves existing notes onto a changed note model
//!
//! A note whose incoming model UUID differs from its local one is migrated
//! through a `ModelMap`. The map for each (old, new) pair is obtained once
//! per session, from the cache or from the resolver, and reused for every
//! later note making the same transition. Migration happens on the
//! in-memory note; committing it is left to the caller.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::collection::{ModelMap, Note, NoteModel, NoteStore};

use super::error::{Result, StoreResultExt, SyncError};
use super::model_map::{ModelMapCache, ModelResolver, Resolution};

pub struct ModelReconciler<'r> {
    cache: ModelMapCache,
    /// Transitions the operator declined; never offered again this session
    declined: HashSet<(Uuid, Uuid)>,
    /// Transitions whose resolved map failed validation, with the reason
    rejected: HashMap<(Uuid, Uuid), String>,
    resolver: Option<Box<dyn ModelResolver + 'r>>,
}

impl<'r> ModelReconciler<'r> {
    /// A reconciler that only applies maps already in its cache
    pub fn new() -> Self {
        Self {
            cache: ModelMapCache::new(),
            declined: HashSet::new(),
            rejected: HashMap::new(),
            resolver: None,
        }
    }

    pub fn with_resolver(resolver: impl ModelResolver + 'r) -> Self {
        Self {
            resolver: Some(Box::new(resolver)),
            ..Self::new()
        }
    }

    pub fn cache(&self) -> &ModelMapCache {
        &self.cache
    }

    /// Find the map taking `note` from `old` onto `new`, asking the resolver
    /// on the first encounter of this transition.
    ///
    /// Returns `None` when the models are the same. Nothing is written to
    /// the store.
    pub fn prepare(
        &mut self,
        note: Uuid,
        old: &NoteModel,
        new: &NoteModel,
    ) -> Result<Option<ModelMap>> {
        if old.uuid == new.uuid {
            return Ok(None);
        }

        let pair = (old.uuid, new.uuid);
        if let Some(map) = self.cache.get(old.uuid, new.uuid) {
            log::debug!("Reusing cached map {} -> {} for note {}", old.uuid, new.uuid, note);
            return Ok(Some(map.clone()));
        }

        if self.declined.contains(&pair) {
            return Err(SyncError::MappingCancelled {
                note,
                old_model: old.uuid,
                new_model: new.uuid,
            });
        }

        if let Some(reason) = self.rejected.get(&pair) {
            return Err(SyncError::InvalidMapping {
                note,
                old_model: old.uuid,
                new_model: new.uuid,
                reason: reason.clone(),
            });
        }

        let Some(resolver) = self.resolver.as_mut() else {
            return Err(SyncError::AmbiguousMapping {
                note,
                old_model: old.uuid,
                new_model: new.uuid,
            });
        };

        log::info!(
            "Resolving model change '{}' ({}) -> '{}' ({})",
            old.name,
            old.uuid,
            new.name,
            new.uuid
        );
        match resolver.resolve(old, new) {
            Resolution::Mapped(map) => match map.validate(old, new) {
                Ok(()) => Ok(Some(self.cache.insert(old.uuid, new.uuid, map).clone())),
                Err(reason) => {
                    log::warn!("Rejected map {} -> {}: {}", old.uuid, new.uuid, reason);
                    self.rejected.insert(pair, reason.clone());
                    Err(SyncError::InvalidMapping {
                        note,
                        old_model: old.uuid,
                        new_model: new.uuid,
                        reason,
                    })
                }
            },
            Resolution::Cancelled => {
                log::warn!("Model change {} -> {} declined", old.uuid, new.uuid);
                self.declined.insert(pair);
                Err(SyncError::MappingCancelled {
                    note,
                    old_model: old.uuid,
                    new_model: new.uuid,
                })
            }
        }
    }

    /// Bring `note` onto `new` in memory, looking up its current model in
    /// `store`. A note already on `new` is returned unchanged. The store is
    /// only read.
    pub fn reconcile<S: NoteStore>(
        &mut self,
        store: &S,
        mut note: Note,
        new: &NoteModel,
    ) -> Result<Note> {
        if note.model_uuid == new.uuid {
            return Ok(note);
        }

        let old = store
            .find_model(note.model_uuid)
            .for_note(note.guid)?
            .ok_or(SyncError::UnknownModel {
                note: note.guid,
                model: note.model_uuid,
            })?;

        if let Some(map) = self.prepare(note.guid, &old, new)? {
            note.migrate(new, &map);
        }
        Ok(note)
    }
}

impl Default for ModelReconciler<'_> {
    fn default() -> Self {
        Self::new()
    }
}
