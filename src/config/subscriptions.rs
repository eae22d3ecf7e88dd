//! Registry of subscribed shared decks
//!
//! Stored as a single JSON object keyed by subscription key:
//! ```text
//! {
//!   "3f2a...": { "timestamp": "...", "deckId": "...", "optionalTags": { "Extra": true } }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ConfigError, ImportConfig, Result};

/// One subscribed shared deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// When the last update was pulled
    pub timestamp: DateTime<Utc>,
    /// Local deck the subscription imports into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<Uuid>,
    /// Optional tag groups offered by the deck and whether the user wants them
    #[serde(default)]
    pub optional_tags: BTreeMap<String, bool>,
}

impl Subscription {
    fn new() -> Self {
        Self {
            timestamp: never_pulled(),
            deck_id: None,
            optional_tags: BTreeMap::new(),
        }
    }

    /// Names of the optional tag groups the user subscribed to
    pub fn enabled_optional_tags(&self) -> impl Iterator<Item = &str> {
        self.optional_tags
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(tag, _)| tag.as_str())
    }
}

/// Timestamp given to fresh subscriptions so the first pull fetches everything
fn never_pulled() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 12, 31, 23, 59, 59)
        .single()
        .unwrap_or_default()
}

pub struct SubscriptionStore {
    path: PathBuf,
    subscriptions: BTreeMap<String, Subscription>,
}

impl SubscriptionStore {
    /// Get the default registry location
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("deckshare").join("subscriptions.json"))
            .ok_or(ConfigError::DataDirNotFound)
    }

    /// Load the registry, treating a missing file as empty
    pub fn load(path: PathBuf) -> Result<Self> {
        let subscriptions = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, subscriptions })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.subscriptions)?)?;
        Ok(())
    }

    pub fn list(&self) -> impl Iterator<Item = (&String, &Subscription)> {
        self.subscriptions.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Subscription> {
        self.subscriptions.get(key)
    }

    fn get_mut(&mut self, key: &str) -> Result<&mut Subscription> {
        self.subscriptions
            .get_mut(key)
            .ok_or_else(|| ConfigError::UnknownSubscription(key.to_string()))
    }

    /// Subscribe to a deck. Returns the normalized key.
    pub fn add(&mut self, key: &str) -> Result<String> {
        // Keys are pasted by hand; stray whitespace is never part of one
        let key: String = key.chars().filter(|c| !c.is_whitespace()).collect();
        if key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        self.subscriptions
            .entry(key.clone())
            .or_insert_with(Subscription::new);
        log::info!("Subscribed to {}", key);
        Ok(key)
    }

    pub fn remove(&mut self, key: &str) -> Result<Subscription> {
        self.subscriptions
            .remove(key)
            .ok_or_else(|| ConfigError::UnknownSubscription(key.to_string()))
    }

    pub fn set_local_deck(&mut self, key: &str, deck_id: Uuid) -> Result<()> {
        self.get_mut(key)?.deck_id = Some(deck_id);
        Ok(())
    }

    /// Record a finished pull: when it happened and the deck it landed in
    pub fn record_pull(&mut self, key: &str, deck_id: Uuid, at: DateTime<Utc>) -> Result<()> {
        let subscription = self.get_mut(key)?;
        subscription.deck_id = Some(deck_id);
        subscription.timestamp = at;
        Ok(())
    }

    /// Rebuild the optional tag choices from the tags the deck currently offers.
    ///
    /// Known tags keep their choice, new tags start unsubscribed and tags the
    /// deck no longer offers are forgotten.
    pub fn update_optional_tags(&mut self, key: &str, available: &[String]) -> Result<()> {
        let subscription = self.get_mut(key)?;
        let choices = available
            .iter()
            .map(|tag| {
                let enabled = subscription.optional_tags.get(tag).copied().unwrap_or(false);
                (tag.clone(), enabled)
            })
            .collect();
        subscription.optional_tags = choices;
        Ok(())
    }

    pub fn set_optional_tag(&mut self, key: &str, tag: &str, enabled: bool) -> Result<()> {
        self.get_mut(key)?
            .optional_tags
            .insert(tag.to_string(), enabled);
        Ok(())
    }

    /// Import settings for one batch of this subscription
    pub fn import_config_for(&self, key: &str, base: &ImportConfig) -> Result<ImportConfig> {
        let subscription = self
            .get(key)
            .ok_or_else(|| ConfigError::UnknownSubscription(key.to_string()))?;

        Ok(ImportConfig {
            has_optional_tags: !subscription.optional_tags.is_empty(),
            optional_tags: subscription
                .enabled_optional_tags()
                .map(str::to_string)
                .collect(),
            ..base.clone()
        })
    }
}
