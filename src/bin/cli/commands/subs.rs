use anyhow::{Context, Result};
use uuid::Uuid;

use crate::app::App;
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let subscriptions = app.subscriptions()?;
    let storage = app.storage()?;

    let deck_name = |deck_id: Option<Uuid>| {
        deck_id
            .and_then(|id| storage.get_deck(id).ok())
            .map(|d| d.name)
            .unwrap_or_else(|| "None".to_string())
    };

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = subscriptions
                .list()
                .map(|(key, sub)| {
                    serde_json::json!({
                        "key": key,
                        "localDeck": deck_name(sub.deck_id),
                        "lastPulled": sub.timestamp.to_rfc3339(),
                        "optionalTags": sub.optional_tags,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let mut any = false;
            for (key, sub) in subscriptions.list() {
                any = true;
                println!("{}  -> {}", key, deck_name(sub.deck_id));
                for (tag, enabled) in &sub.optional_tags {
                    println!("    [{}] {}", if *enabled { "x" } else { " " }, tag);
                }
            }
            if !any {
                println!("No subscriptions.");
            }
        }
    }

    Ok(())
}

pub fn run_add(app: &App, key: &str) -> Result<()> {
    let mut subscriptions = app.subscriptions()?;
    let key = subscriptions.add(key)?;
    subscriptions.save().context("Failed to save subscriptions")?;
    println!("Subscribed to {}", key);
    Ok(())
}

pub fn run_remove(app: &App, key: &str) -> Result<()> {
    let mut subscriptions = app.subscriptions()?;
    subscriptions.remove(key)?;
    subscriptions.save().context("Failed to save subscriptions")?;
    println!("Unsubscribed from {}", key);
    Ok(())
}

pub fn run_set_deck(app: &App, key: &str, deck_name: &str) -> Result<()> {
    let storage = app.storage()?;
    let deck = app.find_deck(&storage, deck_name)?;

    let mut subscriptions = app.subscriptions()?;
    subscriptions.set_local_deck(key, deck.id)?;
    subscriptions.save().context("Failed to save subscriptions")?;
    println!("{} now imports into '{}'", key, deck.name);
    Ok(())
}

pub fn run_tag(app: &App, key: &str, tag: &str, enabled: bool) -> Result<()> {
    let mut subscriptions = app.subscriptions()?;
    subscriptions.set_optional_tag(key, tag, enabled)?;
    subscriptions.save().context("Failed to save subscriptions")?;
    println!(
        "{} optional tag '{}' for {}",
        if enabled { "Enabled" } else { "Disabled" },
        tag,
        key
    );
    Ok(())
}
