use thiserror::Error;
use uuid::Uuid;

use crate::collection::StoreError;

/// Why a single incoming note could not be committed.
///
/// None of these abort a batch; the session records them and moves on.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("note {note}: model {model} is not registered")]
    UnknownModel { note: Uuid, model: Uuid },

    #[error("note {note}: deck {deck} does not exist")]
    UnknownDeck { note: Uuid, deck: Uuid },

    #[error("note {note}: no mapping from model {old_model} to {new_model} and no resolver available")]
    AmbiguousMapping {
        note: Uuid,
        old_model: Uuid,
        new_model: Uuid,
    },

    #[error("note {note}: mapping from model {old_model} to {new_model} was cancelled")]
    MappingCancelled {
        note: Uuid,
        old_model: Uuid,
        new_model: Uuid,
    },

    #[error("note {note}: invalid mapping from model {old_model} to {new_model}: {reason}")]
    InvalidMapping {
        note: Uuid,
        old_model: Uuid,
        new_model: Uuid,
        reason: String,
    },

    #[error("note {note}: model {model} has {expected} fields but {found} were given")]
    FieldCountMismatch {
        note: Uuid,
        model: Uuid,
        expected: usize,
        found: usize,
    },

    #[error("note {note}: store write failed: {source}")]
    StoreWriteFailure {
        note: Uuid,
        #[source]
        source: StoreError,
    },
}

impl SyncError {
    /// The note the failure belongs to
    pub fn note(&self) -> Uuid {
        match self {
            Self::UnknownModel { note, .. }
            | Self::UnknownDeck { note, .. }
            | Self::AmbiguousMapping { note, .. }
            | Self::MappingCancelled { note, .. }
            | Self::InvalidMapping { note, .. }
            | Self::FieldCountMismatch { note, .. }
            | Self::StoreWriteFailure { note, .. } => *note,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Attach the note identity to a store error
pub(crate) trait StoreResultExt<T> {
    fn for_note(self, note: Uuid) -> Result<T>;
}

impl<T> StoreResultExt<T> for std::result::Result<T, StoreError> {
    fn for_note(self, note: Uuid) -> Result<T> {
        self.map_err(|source| SyncError::StoreWriteFailure { note, source })
    }
}
