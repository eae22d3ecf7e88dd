//! Field and tag merge policy for incoming notes
//!
//! Pure functions: nothing here touches the store.

use std::collections::HashSet;

use crate::collection::{Note, NoteModel};
use crate::config::ImportConfig;
use crate::deck::IncomingNote;

/// Tags starting with this marker are only kept for subscribed groups
pub const OPTIONAL_TAG_PREFIX: &str = "AnkiCollab_Optional::";

/// Field values and tags ready to be written to a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContent {
    pub fields: Vec<String>,
    pub tags: Vec<String>,
}

/// Merge an incoming note with the local copy (if any) under `config`.
///
/// `local` must already be laid out for `model`.
pub fn resolve_content(
    incoming: &IncomingNote,
    local: Option<&Note>,
    model: &NoteModel,
    config: &ImportConfig,
) -> ResolvedContent {
    let mut fields = incoming.fields.clone();
    if let Some(local) = local {
        keep_personal_fields(&mut fields, &local.fields, model, config);
    }

    let mut tags = Vec::with_capacity(incoming.tags.len() + config.add_tag_to_cards.len());
    for tag in incoming.tags.iter().chain(&config.add_tag_to_cards) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }

    if config.has_optional_tags {
        let dropped = drop_unsubscribed_tags(&mut tags, config);
        if dropped > 0 {
            log::debug!("Note {}: dropped {} optional tags", incoming.guid, dropped);
        }
    }

    ResolvedContent { fields, tags }
}

fn keep_personal_fields(
    fields: &mut [String],
    local_fields: &[String],
    model: &NoteModel,
    config: &ImportConfig,
) {
    for (index, value) in fields.iter_mut().enumerate() {
        let Some(field_name) = model.field_name(index) else {
            continue;
        };
        if !config.is_personal_field(&model.name, field_name) {
            continue;
        }
        if let Some(local_value) = local_fields.get(index) {
            value.clone_from(local_value);
        }
    }
}

/// Group an optional tag belongs to: the first segment after the marker
pub fn optional_tag_group(tag: &str) -> Option<&str> {
    tag.strip_prefix(OPTIONAL_TAG_PREFIX)
        .map(|rest| rest.split("::").next().unwrap_or(rest))
}

/// Remove optional tags of groups the user has not subscribed to.
/// Returns how many were removed.
fn drop_unsubscribed_tags(tags: &mut Vec<String>, config: &ImportConfig) -> usize {
    let unsubscribed: HashSet<String> = tags
        .iter()
        .filter(|tag| {
            optional_tag_group(tag).map_or(false, |group| !config.optional_tags.contains(group))
        })
        .cloned()
        .collect();

    let before = tags.len();
    tags.retain(|tag| !unsubscribed.contains(tag));
    before - tags.len()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::config::PersonalField;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn incoming(model: &NoteModel, fields: &[&str], tags: &[&str]) -> IncomingNote {
        IncomingNote {
            guid: Uuid::new_v4(),
            note_model_uuid: model.uuid,
            fields: strings(fields),
            tags: strings(tags),
        }
    }

    fn personal(model: &str, field: &str) -> PersonalField {
        PersonalField {
            model: model.to_string(),
            field: field.to_string(),
        }
    }

    #[test]
    fn test_personal_field_keeps_local_value() {
        let model = NoteModel::new("Basic", &["Front", "Back", "Notes"], &["Card 1"]);
        let mut local = Note::new(Uuid::new_v4(), &model, Utc::now());
        local.fields = strings(&["old front", "old back", "my notes"]);
        let config = ImportConfig {
            personal_fields: vec![personal("Basic", "Notes")],
            ..ImportConfig::default()
        };

        let resolved = resolve_content(
            &incoming(&model, &["front", "back", "upstream notes"], &[]),
            Some(&local),
            &model,
            &config,
        );

        assert_eq!(resolved.fields, strings(&["front", "back", "my notes"]));
    }

    #[test]
    fn test_personal_field_on_new_note_uses_incoming() {
        let model = NoteModel::new("Basic", &["Front", "Notes"], &["Card 1"]);
        let config = ImportConfig {
            personal_fields: vec![personal("Basic", "Notes")],
            ..ImportConfig::default()
        };

        let resolved = resolve_content(&incoming(&model, &["a", "b"], &[]), None, &model, &config);

        assert_eq!(resolved.fields, strings(&["a", "b"]));
    }

    #[test]
    fn test_personal_field_is_scoped_to_model_name() {
        let model = NoteModel::new("Cloze", &["Text", "Notes"], &["Cloze"]);
        let mut local = Note::new(Uuid::new_v4(), &model, Utc::now());
        local.fields = strings(&["x", "mine"]);
        let config = ImportConfig {
            personal_fields: vec![personal("Basic", "Notes")],
            ..ImportConfig::default()
        };

        let resolved =
            resolve_content(&incoming(&model, &["y", "theirs"], &[]), Some(&local), &model, &config);

        assert_eq!(resolved.fields, strings(&["y", "theirs"]));
    }

    #[test]
    fn test_added_tags_are_deduplicated() {
        let model = NoteModel::new("Basic", &["Front"], &["Card 1"]);
        let config = ImportConfig {
            add_tag_to_cards: strings(&["shared", "vocab"]),
            ..ImportConfig::default()
        };

        let resolved = resolve_content(&incoming(&model, &["a"], &["vocab", "n5"]), None, &model, &config);

        assert_eq!(resolved.tags, strings(&["vocab", "n5", "shared"]));
    }

    #[test]
    fn test_optional_tags_filtered_to_subscribed_groups() {
        let model = NoteModel::new("Basic", &["Front"], &["Card 1"]);
        let config = ImportConfig {
            has_optional_tags: true,
            optional_tags: ["A".to_string()].into_iter().collect(),
            ..ImportConfig::default()
        };

        let resolved = resolve_content(
            &incoming(
                &model,
                &["a"],
                &["AnkiCollab_Optional::A", "AnkiCollab_Optional::B", "normal"],
            ),
            None,
            &model,
            &config,
        );

        assert_eq!(resolved.tags, strings(&["AnkiCollab_Optional::A", "normal"]));
    }

    #[test]
    fn test_adjacent_unsubscribed_tags_are_all_removed() {
        let model = NoteModel::new("Basic", &["Front"], &["Card 1"]);
        let config = ImportConfig {
            has_optional_tags: true,
            ..ImportConfig::default()
        };

        let resolved = resolve_content(
            &incoming(
                &model,
                &["a"],
                &["AnkiCollab_Optional::B", "AnkiCollab_Optional::C::sub", "keep"],
            ),
            None,
            &model,
            &config,
        );

        assert_eq!(resolved.tags, strings(&["keep"]));
    }

    #[test]
    fn test_optional_tags_untouched_when_disabled() {
        let model = NoteModel::new("Basic", &["Front"], &["Card 1"]);
        let tags = ["AnkiCollab_Optional::B", "normal"];

        let resolved = resolve_content(&incoming(&model, &["a"], &tags), None, &model, &ImportConfig::default());

        assert_eq!(resolved.tags, strings(&tags));
    }

    #[test]
    fn test_optional_tag_group() {
        assert_eq!(optional_tag_group("AnkiCollab_Optional::A"), Some("A"));
        assert_eq!(optional_tag_group("AnkiCollab_Optional::A::Sub"), Some("A"));
        assert_eq!(optional_tag_group("A"), None);
    }
}
