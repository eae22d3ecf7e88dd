//! Synchronization core: reconciling incoming notes with the local collection
//!
//! An `ImportSession` drives a batch. For each incoming note the upsert
//! controller looks the note up by GUID, migrates it through the
//! `ModelReconciler` if its model changed, merges fields and tags under the
//! `ImportConfig` and commits the result.

mod error;
pub mod merge;
mod model_map;
mod reconciler;
mod session;
mod upsert;
pub mod worker;

pub use error::{Result, SyncError};
pub use merge::{resolve_content, ResolvedContent, OPTIONAL_TAG_PREFIX};
pub use model_map::{ModelMapCache, ModelResolver, NameMatchResolver, Resolution};
pub use reconciler::ModelReconciler;
pub use session::{ImportReport, ImportSession, NoteFailure};
pub use upsert::{upsert_note, UpsertOutcome};
pub use worker::{spawn_fetch, FetchError, PendingFetch};
