use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collection::{Note, NoteModel};

/// A note as delivered by the import layer, not yet merged into the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingNote {
    pub guid: Uuid,
    pub note_model_uuid: Uuid,
    pub fields: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<&Note> for IncomingNote {
    fn from(note: &Note) -> Self {
        Self {
            guid: note.guid,
            note_model_uuid: note.model_uuid,
            fields: note.fields.clone(),
            tags: note.tags.clone(),
        }
    }
}

/// A whole shared deck: its models, its notes and the optional tag groups
/// it offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckPayload {
    pub uuid: Uuid,
    pub name: String,
    #[serde(default)]
    pub optional_tags: Vec<String>,
    #[serde(default)]
    pub note_models: Vec<NoteModel>,
    #[serde(default)]
    pub notes: Vec<IncomingNote>,
}

impl DeckPayload {
    pub fn new(uuid: Uuid, name: String) -> Self {
        Self {
            uuid,
            name,
            optional_tags: Vec::new(),
            note_models: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_tags_default_to_empty() {
        let payload = DeckPayload::from_json(
            r#"{"uuid": "6f1c1a4e-52b1-4c1e-9f0e-1d0c4a7b9e01", "name": "Bare"}"#,
        )
        .unwrap();

        assert!(payload.optional_tags.is_empty());
        assert!(payload.notes.is_empty());
    }

    #[test]
    fn test_parse_payload() {
        let content = r#"{
            "uuid": "6f1c1a4e-52b1-4c1e-9f0e-1d0c4a7b9e01",
            "name": "Spanish",
            "optional_tags": ["Grammar"],
            "note_models": [{
                "uuid": "0b8f8d1e-3f3a-4d7e-8c57-2a4cbb0c1f11",
                "name": "Basic",
                "fields": [{"name": "Front"}, {"name": "Back"}],
                "templates": [{"name": "Card 1"}]
            }],
            "notes": [{
                "guid": "a3c1d7e2-5b0f-4f11-9d2c-3b7e5a9f0c21",
                "note_model_uuid": "0b8f8d1e-3f3a-4d7e-8c57-2a4cbb0c1f11",
                "fields": ["hola", "hello"]
            }]
        }"#;

        let payload = DeckPayload::from_json(content).unwrap();
        let note = &payload.notes[0];

        assert!(note.tags.is_empty());
        assert_eq!(payload.optional_tags, vec!["Grammar".to_string()]);
        assert_eq!(note.note_model_uuid, payload.note_models[0].uuid);
        assert_eq!(payload.note_models[0].field_name(1), Some("Back"));
    }
}
