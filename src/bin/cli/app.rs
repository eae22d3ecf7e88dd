use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use deckshare_lib::collection::{CollectionStorage, Deck};
use deckshare_lib::config::SubscriptionStore;

/// Shared application state for CLI commands
pub struct App {
    collection_path: PathBuf,
    subscriptions_path: PathBuf,
}

impl App {
    pub fn new(collection: Option<PathBuf>, subscriptions: Option<PathBuf>) -> Result<Self> {
        let collection_path = match collection {
            Some(path) => path,
            None => CollectionStorage::default_data_dir()
                .context("Failed to get data directory")?,
        };
        let subscriptions_path = match subscriptions {
            Some(path) => path,
            None => SubscriptionStore::default_path()
                .context("Failed to get config directory")?,
        };

        Ok(Self {
            collection_path,
            subscriptions_path,
        })
    }

    /// Open the collection, creating its directories on first use
    pub fn storage(&self) -> Result<CollectionStorage> {
        let storage = CollectionStorage::new(self.collection_path.clone());
        storage.init().with_context(|| {
            format!("Failed to initialize collection at {}", self.collection_path.display())
        })?;
        Ok(storage)
    }

    pub fn subscriptions(&self) -> Result<SubscriptionStore> {
        SubscriptionStore::load(self.subscriptions_path.clone())
            .with_context(|| format!("Failed to read {}", self.subscriptions_path.display()))
    }

    /// Find a deck by name or fail with the list of known decks
    pub fn find_deck(&self, storage: &CollectionStorage, name: &str) -> Result<Deck> {
        if let Some(deck) = storage.find_deck_by_name(name).context("Failed to list decks")? {
            return Ok(deck);
        }

        let decks = storage.list_decks().context("Failed to list decks")?;
        anyhow::bail!(
            "No deck named '{}'. Available decks:\n{}",
            name,
            decks
                .iter()
                .map(|d| format!("  - {}", d.name))
                .collect::<Vec<_>>()
                .join("\n")
        )
    }

    pub fn collection_path(&self) -> &Path {
        &self.collection_path
    }
}
