use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use deckshare_lib::deck::export_deck;

use crate::app::App;

pub fn run(app: &App, deck_name: &str, output: Option<&Path>) -> Result<()> {
    let storage = app.storage()?;
    let deck = app.find_deck(&storage, deck_name)?;

    let payload = export_deck(&storage, &deck).context("Failed to export deck")?;
    let json = payload.to_json()?;

    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Exported {} notes from '{}' to {}",
                payload.notes.len(),
                deck.name,
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
