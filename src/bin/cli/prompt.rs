use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use deckshare_lib::collection::{ModelMap, NoteModel};
use deckshare_lib::sync::{ModelResolver, NameMatchResolver, Resolution};

/// Asks the operator on stdin how to map a changed model.
///
/// Each old field and template is offered the name-matched slot as default;
/// `-` drops it and `q` cancels the whole mapping.
pub struct StdinResolver;

enum Answer {
    Slot(Option<usize>),
    Cancel,
}

impl ModelResolver for StdinResolver {
    fn resolve(&mut self, old: &NoteModel, new: &NoteModel) -> Resolution {
        let Resolution::Mapped(suggested) = NameMatchResolver.resolve(old, new) else {
            return Resolution::Cancelled;
        };

        println!("Note model '{}' changed upstream to '{}'.", old.name, new.name);

        let old_fields: Vec<&str> = old.fields.iter().map(|f| f.name.as_str()).collect();
        let new_fields: Vec<&str> = new.fields.iter().map(|f| f.name.as_str()).collect();
        let Some(field_map) = ask_section("field", &old_fields, &new_fields, &suggested.field_map) else {
            return Resolution::Cancelled;
        };

        let old_templates: Vec<&str> = old.templates.iter().map(|t| t.name.as_str()).collect();
        let new_templates: Vec<&str> = new.templates.iter().map(|t| t.name.as_str()).collect();
        let Some(template_map) =
            ask_section("template", &old_templates, &new_templates, &suggested.template_map)
        else {
            return Resolution::Cancelled;
        };

        Resolution::Mapped(ModelMap::new(field_map, template_map))
    }
}

fn ask_section(
    kind: &str,
    old: &[&str],
    new: &[&str],
    suggested: &BTreeMap<usize, usize>,
) -> Option<BTreeMap<usize, usize>> {
    println!("New {}s:", kind);
    for (index, name) in new.iter().enumerate() {
        println!("  {}: {}", index + 1, name);
    }

    let mut map = BTreeMap::new();
    for (from, name) in old.iter().enumerate() {
        let default = suggested.get(&from).copied();
        let hint = default.map_or("-".to_string(), |to| (to + 1).to_string());
        loop {
            print!("Old {} '{}' -> [{}] ", kind, name, hint);
            io::stdout().flush().ok()?;

            match read_answer(new.len(), default)? {
                Some(Answer::Slot(Some(to))) => {
                    map.insert(from, to);
                    break;
                }
                Some(Answer::Slot(None)) => break,
                Some(Answer::Cancel) => return None,
                None => println!("Enter 1-{}, '-' to drop or 'q' to cancel.", new.len()),
            }
        }
    }

    Some(map)
}

/// `None` on end of input; `Some(None)` for an unparseable answer
fn read_answer(slots: usize, default: Option<usize>) -> Option<Option<Answer>> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).ok()? == 0 {
        return None;
    }

    let answer = match line.trim() {
        "" => Some(Answer::Slot(default)),
        "-" => Some(Answer::Slot(None)),
        "q" => Some(Answer::Cancel),
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=slots).contains(n))
            .map(|n| Answer::Slot(Some(n - 1))),
    };
    Some(answer)
}
