//! Serializable deck representation shared with the remote service

mod export;
mod payload;

pub use export::export_deck;
pub use payload::{DeckPayload, IncomingNote};
