use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::collection::{ModelMap, NoteModel};

/// Maps resolved during one import session, keyed by (old model, new model)
#[derive(Debug, Default)]
pub struct ModelMapCache {
    maps: HashMap<Uuid, HashMap<Uuid, ModelMap>>,
}

impl ModelMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, old_uuid: Uuid, new_uuid: Uuid) -> Option<&ModelMap> {
        self.maps.get(&old_uuid)?.get(&new_uuid)
    }

    /// Remember the map for a transition. The first map stored for a pair wins.
    pub fn insert(&mut self, old_uuid: Uuid, new_uuid: Uuid, map: ModelMap) -> &ModelMap {
        self.maps
            .entry(old_uuid)
            .or_default()
            .entry(new_uuid)
            .or_insert(map)
    }

    /// Number of cached transitions
    pub fn len(&self) -> usize {
        self.maps.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Answer from a resolver asked to map one model onto another
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Mapped(ModelMap),
    Cancelled,
}

/// Supplies a field/template mapping the first time a model transition is seen.
///
/// Called synchronously on the store-owning thread, at most once per
/// (old model, new model) pair in a session.
pub trait ModelResolver {
    fn resolve(&mut self, old: &NoteModel, new: &NoteModel) -> Resolution;
}

impl<F> ModelResolver for F
where
    F: FnMut(&NoteModel, &NoteModel) -> Resolution,
{
    fn resolve(&mut self, old: &NoteModel, new: &NoteModel) -> Resolution {
        self(old, new)
    }
}

/// Maps fields and templates with the same name, then leftovers by position
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatchResolver;

impl ModelResolver for NameMatchResolver {
    fn resolve(&mut self, old: &NoteModel, new: &NoteModel) -> Resolution {
        let old_fields: Vec<&str> = old.fields.iter().map(|f| f.name.as_str()).collect();
        let new_fields: Vec<&str> = new.fields.iter().map(|f| f.name.as_str()).collect();
        let old_templates: Vec<&str> = old.templates.iter().map(|t| t.name.as_str()).collect();
        let new_templates: Vec<&str> = new.templates.iter().map(|t| t.name.as_str()).collect();

        Resolution::Mapped(ModelMap::new(
            match_names(&old_fields, &new_fields),
            match_names(&old_templates, &new_templates),
        ))
    }
}

fn match_names(old: &[&str], new: &[&str]) -> BTreeMap<usize, usize> {
    let mut map = BTreeMap::new();
    let mut taken = vec![false; new.len()];

    for (from, name) in old.iter().enumerate() {
        if let Some(to) = (0..new.len()).find(|&to| !taken[to] && new[to] == *name) {
            taken[to] = true;
            map.insert(from, to);
        }
    }

    // A new slot whose name matches some old entry is reserved for it
    for from in 0..old.len() {
        if map.contains_key(&from) || from >= new.len() || taken[from] {
            continue;
        }
        if old.contains(&new[from]) {
            continue;
        }
        taken[from] = true;
        map.insert(from, from);
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_first_insert_wins() {
        let mut cache = ModelMapCache::new();
        let (old, new) = (Uuid::new_v4(), Uuid::new_v4());
        let first = ModelMap::new([(0, 0)].into_iter().collect(), BTreeMap::new());
        let second = ModelMap::new([(0, 1)].into_iter().collect(), BTreeMap::new());

        cache.insert(old, new, first.clone());
        cache.insert(old, new, second);

        assert_eq!(cache.get(old, new), Some(&first));
        assert!(cache.get(new, old).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_name_match_prefers_names_then_positions() {
        let old = NoteModel::new("Vocab", &["Word", "Meaning", "Notes"], &["Recognition"]);
        let new = NoteModel::new("Vocab v2", &["Meaning", "Word", "Audio"], &["Recall", "Recognition"]);

        let Resolution::Mapped(map) = NameMatchResolver.resolve(&old, &new) else {
            panic!("name matching never cancels");
        };

        assert_eq!(map.field_map, [(0, 1), (1, 0), (2, 2)].into_iter().collect());
        assert_eq!(map.template_map, [(0, 1)].into_iter().collect());
        assert!(map.validate(&old, &new).is_ok());
    }

    #[test]
    fn test_name_match_drops_when_no_slot_left() {
        let old = NoteModel::new("A", &["Front", "Back", "Extra"], &[]);
        let new = NoteModel::new("B", &["Front", "Back"], &[]);

        let Resolution::Mapped(map) = NameMatchResolver.resolve(&old, &new) else {
            panic!("name matching never cancels");
        };

        assert_eq!(map.field_map, [(0, 0), (1, 1)].into_iter().collect());
    }

    #[test]
    fn test_closure_resolver() {
        let old = NoteModel::new("A", &["Front"], &[]);
        let new = NoteModel::new("B", &["Front"], &[]);
        let mut resolver = |_: &NoteModel, _: &NoteModel| Resolution::Cancelled;

        assert_eq!(resolver.resolve(&old, &new), Resolution::Cancelled);
    }
}
