use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Result;

/// A field whose local value always wins over incoming data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalField {
    /// Note model name
    pub model: String,
    /// Field name within that model
    pub field: String,
}

/// Per-deck import settings.
///
/// Loaded once before a batch and never mutated while it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub personal_fields: Vec<PersonalField>,
    /// Tags appended to every imported note
    pub add_tag_to_cards: Vec<String>,
    /// Whether optional tags are filtered at all
    pub has_optional_tags: bool,
    /// Optional tag groups the user subscribed to
    pub optional_tags: BTreeSet<String>,
    /// Leave existing cards in whatever deck they are in
    pub ignore_deck_movement: bool,
}

impl ImportConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        log::debug!(
            "Loaded import config from {:?} ({} personal fields)",
            path,
            config.personal_fields.len()
        );
        Ok(config)
    }

    pub fn is_personal_field(&self, model_name: &str, field_name: &str) -> bool {
        self.personal_fields
            .iter()
            .any(|p| p.model == model_name && p.field == field_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = ImportConfig::from_toml_str(
            r#"
            add_tag_to_cards = ["shared"]
            has_optional_tags = true
            optional_tags = ["Extra"]
            ignore_deck_movement = true

            [[personal_fields]]
            model = "Basic"
            field = "Notes"
            "#,
        )
        .unwrap();

        assert_eq!(config.add_tag_to_cards, vec!["shared".to_string()]);
        assert!(config.has_optional_tags);
        assert!(config.optional_tags.contains("Extra"));
        assert!(config.ignore_deck_movement);
        assert!(config.is_personal_field("Basic", "Notes"));
        assert!(!config.is_personal_field("Basic", "Front"));
        assert!(!config.is_personal_field("Cloze", "Notes"));
    }

    #[test]
    fn test_missing_keys_default() {
        let config = ImportConfig::from_toml_str("").unwrap();
        assert_eq!(config, ImportConfig::default());
    }
}
