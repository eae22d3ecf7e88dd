//! Data models for the local note collection

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named field slot of a note model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
}

/// A card template of a note model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDef {
    pub name: String,
}

/// Schema describing a note's fields and card templates.
///
/// Models are immutable once published; a changed model is published
/// under a new UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteModel {
    pub uuid: Uuid,
    pub name: String,
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub templates: Vec<TemplateDef>,
}

impl NoteModel {
    pub fn new(name: &str, fields: &[&str], templates: &[&str]) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|name| FieldDef { name: name.to_string() })
                .collect(),
            templates: templates
                .iter()
                .map(|name| TemplateDef { name: name.to_string() })
                .collect(),
        }
    }

    /// Name of the field at `index`, if the model has one there
    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|f| f.name.as_str())
    }
}

/// A card generated from one template of a note's model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Index of the template in the note's model
    pub template: usize,
    /// Deck the card currently lives in
    pub deck_id: Uuid,
}

/// A note committed to the local collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Stable identifier shared with the remote deck
    pub guid: Uuid,
    pub model_uuid: Uuid,
    pub fields: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cards: Vec<Card>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Note {
    /// Allocate a note bound to `model` with empty fields and no cards
    pub fn new(guid: Uuid, model: &NoteModel, now: DateTime<Utc>) -> Self {
        Self {
            guid,
            model_uuid: model.uuid,
            fields: vec![String::new(); model.fields.len()],
            tags: Vec::new(),
            cards: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Whether any of the note's cards live in `deck_id`
    pub fn has_card_in(&self, deck_id: Uuid) -> bool {
        self.cards.iter().any(|c| c.deck_id == deck_id)
    }

    /// Rebind the note to `new_model`, translating fields and cards through `map`.
    /// Only the in-memory note changes.
    pub fn migrate(&mut self, new_model: &NoteModel, map: &ModelMap) {
        self.fields = map.remap_fields(&self.fields, new_model.fields.len());
        self.cards = map.remap_cards(&self.cards);
        self.model_uuid = new_model.uuid;
    }

    /// Move every card of the note into `deck_id`
    pub fn move_cards(&mut self, deck_id: Uuid) {
        for card in &mut self.cards {
            card.deck_id = deck_id;
        }
    }
}

/// A deck is the container holding a note's cards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Translation of field and template positions from one model to another.
///
/// Positions missing from a map are dropped when the map is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMap {
    pub field_map: BTreeMap<usize, usize>,
    pub template_map: BTreeMap<usize, usize>,
}

impl ModelMap {
    pub fn new(field_map: BTreeMap<usize, usize>, template_map: BTreeMap<usize, usize>) -> Self {
        Self { field_map, template_map }
    }

    /// Check that every target exists in `new` and that no two sources share a target
    pub fn validate(&self, old: &NoteModel, new: &NoteModel) -> Result<(), String> {
        check_positions("field", &self.field_map, old.fields.len(), new.fields.len())?;
        check_positions(
            "template",
            &self.template_map,
            old.templates.len(),
            new.templates.len(),
        )
    }

    /// Lay out `old` field values in the new model's order
    pub fn remap_fields(&self, old: &[String], new_len: usize) -> Vec<String> {
        let mut fields = vec![String::new(); new_len];
        for (&from, &to) in &self.field_map {
            if let (Some(value), Some(slot)) = (old.get(from), fields.get_mut(to)) {
                *slot = value.clone();
            }
        }
        fields
    }

    /// Point cards at their new templates, dropping cards whose template is unmapped
    pub fn remap_cards(&self, cards: &[Card]) -> Vec<Card> {
        cards
            .iter()
            .filter_map(|card| {
                self.template_map.get(&card.template).map(|&template| Card {
                    template,
                    deck_id: card.deck_id,
                })
            })
            .collect()
    }
}

fn check_positions(
    kind: &str,
    map: &BTreeMap<usize, usize>,
    old_len: usize,
    new_len: usize,
) -> Result<(), String> {
    let mut seen = vec![false; new_len];
    for (&from, &to) in map {
        if from >= old_len {
            return Err(format!("old {} {} does not exist", kind, from));
        }
        match seen.get_mut(to) {
            None => return Err(format!("new {} {} does not exist", kind, to)),
            Some(true) => return Err(format!("new {} {} is mapped twice", kind, to)),
            Some(taken) => *taken = true,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(usize, usize)]) -> BTreeMap<usize, usize> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_remap_fields_drops_unmapped() {
        let model_map = ModelMap::new(map(&[(0, 1), (2, 0)]), BTreeMap::new());
        let old = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let fields = model_map.remap_fields(&old, 3);

        assert_eq!(fields, vec!["c".to_string(), "a".to_string(), String::new()]);
    }

    #[test]
    fn test_remap_cards_drops_unmapped_templates() {
        let deck_id = Uuid::new_v4();
        let model_map = ModelMap::new(BTreeMap::new(), map(&[(1, 0)]));
        let cards = vec![
            Card { template: 0, deck_id },
            Card { template: 1, deck_id },
        ];

        let remapped = model_map.remap_cards(&cards);

        assert_eq!(remapped, vec![Card { template: 0, deck_id }]);
    }

    #[test]
    fn test_migrate_remaps_fields_and_cards() {
        let deck_id = Uuid::new_v4();
        let now = Utc::now();
        let old = NoteModel::new("Basic", &["Front", "Back"], &["Card 1"]);
        let new = NoteModel::new("Basic v2", &["Back", "Front", "Extra"], &["Forward", "Reverse"]);
        let mut note = Note::new(Uuid::new_v4(), &old, now);
        note.fields = vec!["hola".to_string(), "hello".to_string()];
        note.cards = vec![Card { template: 0, deck_id }];

        note.migrate(&new, &ModelMap::new(map(&[(0, 1), (1, 0)]), map(&[(0, 1)])));

        assert_eq!(note.model_uuid, new.uuid);
        assert_eq!(note.fields, vec!["hello".to_string(), "hola".to_string(), String::new()]);
        assert_eq!(note.cards, vec![Card { template: 1, deck_id }]);
        assert_eq!(note.modified_at, now);
    }

    #[test]
    fn test_validate_rejects_out_of_range_and_duplicates() {
        let old = NoteModel::new("Old", &["Front", "Back"], &["Card 1"]);
        let new = NoteModel::new("New", &["Front"], &["Card 1"]);

        let out_of_range = ModelMap::new(map(&[(1, 1)]), BTreeMap::new());
        assert!(out_of_range.validate(&old, &new).is_err());

        let duplicate = ModelMap::new(map(&[(0, 0), (1, 0)]), BTreeMap::new());
        assert!(duplicate.validate(&old, &new).is_err());

        let ok = ModelMap::new(map(&[(1, 0)]), map(&[(0, 0)]));
        assert!(ok.validate(&old, &new).is_ok());
    }
}
