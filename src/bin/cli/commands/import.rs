use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use deckshare_lib::config::ImportConfig;
use deckshare_lib::deck::DeckPayload;
use deckshare_lib::sync::{spawn_fetch, FetchError, ImportReport, ImportSession, NameMatchResolver};

use crate::app::App;
use crate::prompt::StdinResolver;
use crate::OutputFormat;

/// How changed note models get their field/template map
pub enum Mapping {
    /// Never guess; notes needing a new map fail
    Cached,
    ByName,
    Interactive,
}

pub fn run(
    app: &App,
    payload_path: &Path,
    deck_name: Option<&str>,
    config_path: Option<&Path>,
    subscription: Option<&str>,
    mapping: Mapping,
    format: &OutputFormat,
) -> Result<()> {
    let path = payload_path.to_path_buf();
    let payload = match spawn_fetch(move || load_payload(&path)).wait() {
        Ok(payload) => payload,
        Err(FetchError::Failed(e)) => return Err(e),
        Err(e) => anyhow::bail!("{}", e),
    };

    let base = match config_path {
        Some(path) => ImportConfig::load(path)
            .with_context(|| format!("Failed to load import config {}", path.display()))?,
        None => ImportConfig::default(),
    };

    let mut subscriptions = app.subscriptions()?;
    let config = match subscription {
        Some(key) => {
            subscriptions.update_optional_tags(key, &payload.optional_tags)?;
            subscriptions.import_config_for(key, &base)?
        }
        None => base,
    };

    let mut storage = app.storage()?;
    let subscribed_deck = subscription
        .and_then(|key| subscriptions.get(key))
        .and_then(|sub| sub.deck_id);
    let deck = match choose_deck(deck_name, subscription, subscribed_deck, &payload.name)? {
        DeckChoice::Named(name) => storage.ensure_deck(name).context("Failed to open deck")?,
        DeckChoice::Existing(deck_id) => storage
            .get_deck(deck_id)
            .with_context(|| format!("Subscribed deck {} no longer exists; pass --deck", deck_id))?,
    };

    let report = {
        let mut session = match mapping {
            Mapping::Cached => ImportSession::new(&mut storage, &config),
            Mapping::ByName => ImportSession::with_resolver(&mut storage, &config, NameMatchResolver),
            Mapping::Interactive => ImportSession::with_resolver(&mut storage, &config, StdinResolver),
        };
        session.import_deck(&payload, deck.id).context("Import failed")?
    };

    if let Some(key) = subscription {
        subscriptions.record_pull(key, deck.id, Utc::now())?;
        subscriptions.save().context("Failed to save subscriptions")?;
    }

    print_report(app, &deck.name, &report, format)
}

#[derive(Debug, PartialEq)]
enum DeckChoice<'a> {
    /// Find or create the deck with this name
    Named(&'a str),
    Existing(Uuid),
}

/// `--deck` wins; otherwise a subscription imports into its recorded deck,
/// or on its first pull into a deck named after the shared deck.
fn choose_deck<'a>(
    deck_name: Option<&'a str>,
    subscription: Option<&str>,
    subscribed_deck: Option<Uuid>,
    payload_name: &'a str,
) -> Result<DeckChoice<'a>> {
    match (deck_name, subscription, subscribed_deck) {
        (Some(name), _, _) => Ok(DeckChoice::Named(name)),
        (None, Some(_), Some(deck_id)) => Ok(DeckChoice::Existing(deck_id)),
        (None, Some(_), None) => Ok(DeckChoice::Named(payload_name)),
        (None, None, _) => anyhow::bail!("--deck is required when importing without --subscription"),
    }
}

/// Read and parse a payload file; runs on the fetch worker
fn load_payload(path: &Path) -> Result<DeckPayload> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    DeckPayload::from_json(&content).context("Failed to parse deck payload")
}

fn print_report(app: &App, deck_name: &str, report: &ImportReport, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let failures: Vec<serde_json::Value> = report
                .failures
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "guid": f.guid.to_string(),
                        "error": f.error.to_string(),
                    })
                })
                .collect();
            let mut output = serde_json::to_value(report)?;
            output["failures"] = serde_json::Value::Array(failures);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!(
                "Imported into '{}' ({})",
                deck_name,
                app.collection_path().display()
            );
            println!(
                "  {} created, {} updated, {} failed, {} new models ({} ms)",
                report.created,
                report.updated,
                report.failed(),
                report.models_added,
                report.duration_ms
            );
            for failure in &report.failures {
                println!("  ! {}", failure.error);
            }
        }
    }

    Ok(())
}
