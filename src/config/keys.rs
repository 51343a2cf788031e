//! # Key Bindings
//!
//! Bindings are grouped per component. A section only holds the keys that
//! component reacts to, so the help overlay and the key-hint footer can show
//! exactly what is available where focus currently is.
//!
//! A [`Key`] lists named keys (`"Enter"`, `"Ctrl+Y"`) and/or single-character
//! runes (`"p"`, `"/"`). Loaded files may be sparse: anything left out falls
//! back to [`KeyBindings::defaults`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

use super::merge::{Merge, merge_fields};
use crate::core::id::{self, ComponentId};

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Key {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runes: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Key {
    fn named(keys: &[&str], description: &str) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            runes: Vec::new(),
            description: description.to_string(),
        }
    }

    fn runes(runes: &[&str], description: &str) -> Self {
        Self {
            keys: Vec::new(),
            runes: runes.iter().map(|r| r.to_string()).collect(),
            description: description.to_string(),
        }
    }

    fn with_keys(mut self, keys: &[&str]) -> Self {
        self.keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    fn is_unbound(&self) -> bool {
        self.keys.is_empty() && self.runes.is_empty()
    }

    /// Whether a terminal key event triggers this binding.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        match key_name(event) {
            Some(KeyName::Rune(' ')) => self.keys.iter().any(|k| k == "Space"),
            Some(KeyName::Rune(c)) => {
                let mut buf = [0u8; 4];
                let rune: &str = c.encode_utf8(&mut buf);
                self.runes.iter().any(|r| r == rune)
            }
            Some(KeyName::Named(name)) => {
                // Many terminals report Ctrl+H as Backspace.
                let alias = (name == "Backspace").then_some("Ctrl+H");
                self.keys
                    .iter()
                    .any(|k| *k == name || Some(k.as_str()) == alias)
            }
            None => false,
        }
    }

    /// Human-readable binding, e.g. `"Enter, p"`.
    pub fn label(&self) -> String {
        self.keys
            .iter()
            .chain(self.runes.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Merge for Key {
    fn merge_defaults(&mut self, defaults: &Self) {
        // A binding is replaced as a whole so a user override never inherits
        // stray default keys.
        if self.is_unbound() {
            self.keys.clone_from(&defaults.keys);
            self.runes.clone_from(&defaults.runes);
        }
        self.description.merge_defaults(&defaults.description);
    }
}

/// Normalized name of a terminal key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyName {
    Rune(char),
    Named(String),
}

pub fn key_name(event: &KeyEvent) -> Option<KeyName> {
    let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
    let alt = event.modifiers.contains(KeyModifiers::ALT);
    let name = match event.code {
        KeyCode::Char(c) if ctrl => format!("Ctrl+{}", c.to_ascii_uppercase()),
        KeyCode::Char(c) if alt => format!("Alt+{c}"),
        KeyCode::Char(c) => return Some(KeyName::Rune(c)),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Backtab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::Up => modified("Up", ctrl),
        KeyCode::Down => modified("Down", ctrl),
        KeyCode::Left => modified("Left", ctrl),
        KeyCode::Right => modified("Right", ctrl),
        KeyCode::F(n) => format!("F{n}"),
        _ => return None,
    };
    Some(KeyName::Named(name))
}

fn modified(base: &str, ctrl: bool) -> String {
    if ctrl {
        format!("Ctrl+{base}")
    } else {
        base.to_string()
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyBindings {
    pub global: GlobalKeys,
    pub root: RootKeys,
    pub databases: DatabasesKeys,
    pub content: ContentKeys,
    pub input_bar: InputBarKeys,
    pub doc_peeker: DocPeekerKeys,
    pub history: HistoryKeys,
    pub help: HelpKeys,
    pub style_picker: StylePickerKeys,
}

/// Keys that work from any view (unless an input bar captures them).
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalKeys {
    pub toggle_help: Key,
    pub open_style_picker: Key,
    pub reload_keys: Key,
    pub quit: Key,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RootKeys {
    pub toggle_focus: Key,
    pub focus_databases: Key,
    pub focus_content: Key,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabasesKeys {
    pub filter_bar: Key,
    pub select: Key,
    pub refresh: Key,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentKeys {
    pub peek_document: Key,
    pub add_document: Key,
    pub edit_document: Key,
    pub toggle_query: Key,
    pub next_page: Key,
    pub previous_page: Key,
    pub refresh: Key,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InputBarKeys {
    pub show_history: Key,
    pub clear_input: Key,
    pub accept_suggestion: Key,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocPeekerKeys {
    pub move_to_top: Key,
    pub move_to_bottom: Key,
    pub edit: Key,
    pub refresh: Key,
    pub close: Key,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistoryKeys {
    pub accept_entry: Key,
    pub clear_history: Key,
    pub close_history: Key,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HelpKeys {
    pub close: Key,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StylePickerKeys {
    pub select: Key,
    pub close: Key,
}

merge_fields!(KeyBindings {
    global,
    root,
    databases,
    content,
    input_bar,
    doc_peeker,
    history,
    help,
    style_picker,
});
merge_fields!(GlobalKeys { toggle_help, open_style_picker, reload_keys, quit });
merge_fields!(RootKeys { toggle_focus, focus_databases, focus_content });
merge_fields!(DatabasesKeys { filter_bar, select, refresh });
merge_fields!(ContentKeys {
    peek_document,
    add_document,
    edit_document,
    toggle_query,
    next_page,
    previous_page,
    refresh,
});
merge_fields!(InputBarKeys { show_history, clear_input, accept_suggestion });
merge_fields!(DocPeekerKeys { move_to_top, move_to_bottom, edit, refresh, close });
merge_fields!(HistoryKeys { accept_entry, clear_history, close_history });
merge_fields!(HelpKeys { close });
merge_fields!(StylePickerKeys { select, close });

/// The bindings of one section, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedKeys {
    pub element: &'static str,
    pub keys: Vec<Key>,
}

impl KeyBindings {
    pub fn defaults() -> Self {
        Self {
            global: GlobalKeys {
                toggle_help: Key::runes(&["?"], "Toggle help"),
                open_style_picker: Key::named(&["Ctrl+T"], "Change style"),
                reload_keys: Key::named(&["F5"], "Reload key bindings"),
                quit: Key::named(&["Ctrl+C"], "Quit"),
            },
            root: RootKeys {
                toggle_focus: Key::named(&["Tab", "Backtab"], "Focus next view"),
                focus_databases: Key::named(&["Ctrl+H"], "Focus databases"),
                focus_content: Key::named(&["Ctrl+L"], "Focus content"),
            },
            databases: DatabasesKeys {
                filter_bar: Key::runes(&["/"], "Filter collections"),
                select: Key::named(&["Enter", "Space"], "Open collection"),
                refresh: Key::runes(&["R"], "Refresh"),
            },
            content: ContentKeys {
                peek_document: Key::runes(&["p"], "Peek document").with_keys(&["Enter"]),
                add_document: Key::runes(&["A"], "Add document"),
                edit_document: Key::runes(&["E"], "Edit document"),
                toggle_query: Key::runes(&["/"], "Query"),
                next_page: Key::runes(&["n"], "Next page"),
                previous_page: Key::runes(&["b"], "Previous page"),
                refresh: Key::runes(&["R"], "Refresh"),
            },
            input_bar: InputBarKeys {
                show_history: Key::named(&["Ctrl+Y"], "Show history"),
                clear_input: Key::named(&["Ctrl+D"], "Clear input"),
                accept_suggestion: Key::named(&["Tab"], "Accept suggestion"),
            },
            doc_peeker: DocPeekerKeys {
                move_to_top: Key::runes(&["g"], "Move to top"),
                move_to_bottom: Key::runes(&["G"], "Move to bottom"),
                edit: Key::runes(&["e"], "Edit document"),
                refresh: Key::runes(&["R"], "Refresh document").with_keys(&["Ctrl+R"]),
                close: Key::runes(&["q"], "Close").with_keys(&["Esc"]),
            },
            history: HistoryKeys {
                accept_entry: Key::named(&["Enter", "Space"], "Accept entry"),
                clear_history: Key::runes(&["C"], "Clear history"),
                close_history: Key::named(&["Esc", "Ctrl+Y"], "Close history"),
            },
            help: HelpKeys {
                close: Key::runes(&["?"], "Close help").with_keys(&["Esc"]),
            },
            style_picker: StylePickerKeys {
                select: Key::named(&["Enter"], "Apply style"),
                close: Key::named(&["Esc"], "Close"),
            },
        }
    }

    /// Complete a sparse set of bindings from the defaults.
    pub fn completed(mut self) -> Self {
        self.merge_defaults(&Self::defaults());
        self
    }

    /// Every section in display order, global bindings first.
    pub fn all_keys(&self) -> Vec<OrderedKeys> {
        [
            "Global",
            "Root",
            "Databases",
            "Content",
            "InputBar",
            "DocPeeker",
            "History",
            "Help",
            "StylePicker",
        ]
        .into_iter()
        .filter_map(|element| self.section(element))
        .collect()
    }

    /// Bindings of the section that serves `component`, if it has one.
    pub fn keys_for(&self, component: &ComponentId) -> Option<OrderedKeys> {
        let element = if *component == id::QUERY_BAR || *component == id::FILTER_BAR {
            "InputBar"
        } else {
            component.as_str()
        };
        self.section(element)
    }

    fn section(&self, element: &str) -> Option<OrderedKeys> {
        let (element, keys): (&'static str, Vec<&Key>) = match element {
            "Global" => {
                let g = &self.global;
                ("Global", vec![&g.toggle_help, &g.open_style_picker, &g.reload_keys, &g.quit])
            }
            "Root" => {
                let r = &self.root;
                ("Root", vec![&r.toggle_focus, &r.focus_databases, &r.focus_content])
            }
            "Databases" => {
                let d = &self.databases;
                ("Databases", vec![&d.select, &d.filter_bar, &d.refresh])
            }
            "Content" => {
                let c = &self.content;
                (
                    "Content",
                    vec![
                        &c.peek_document,
                        &c.toggle_query,
                        &c.next_page,
                        &c.previous_page,
                        &c.add_document,
                        &c.edit_document,
                        &c.refresh,
                    ],
                )
            }
            "InputBar" => {
                let i = &self.input_bar;
                ("InputBar", vec![&i.accept_suggestion, &i.show_history, &i.clear_input])
            }
            "DocPeeker" => {
                let d = &self.doc_peeker;
                (
                    "DocPeeker",
                    vec![&d.edit, &d.refresh, &d.move_to_top, &d.move_to_bottom, &d.close],
                )
            }
            "History" => {
                let h = &self.history;
                ("History", vec![&h.accept_entry, &h.clear_history, &h.close_history])
            }
            "Help" => ("Help", vec![&self.help.close]),
            "StylePicker" => {
                let s = &self.style_picker;
                ("StylePicker", vec![&s.select, &s.close])
            }
            _ => return None,
        };
        Some(OrderedKeys {
            element,
            keys: keys.into_iter().cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_rune_and_named_matching() {
        let keys = KeyBindings::defaults();
        let peek = &keys.content.peek_document;
        assert!(peek.matches(&press(KeyCode::Char('p'), KeyModifiers::NONE)));
        assert!(peek.matches(&press(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(!peek.matches(&press(KeyCode::Char('P'), KeyModifiers::SHIFT)));
    }

    #[test]
    fn test_ctrl_keys_are_named_uppercase() {
        let keys = KeyBindings::defaults();
        let event = press(KeyCode::Char('y'), KeyModifiers::CONTROL);
        assert_eq!(key_name(&event), Some(KeyName::Named("Ctrl+Y".to_string())));
        assert!(keys.input_bar.show_history.matches(&event));
    }

    #[test]
    fn test_space_rune_matches_space_key() {
        let keys = KeyBindings::defaults();
        assert!(
            keys.history
                .accept_entry
                .matches(&press(KeyCode::Char(' '), KeyModifiers::NONE))
        );
    }

    #[test]
    fn test_backspace_aliases_ctrl_h() {
        let keys = KeyBindings::defaults();
        assert!(
            keys.root
                .focus_databases
                .matches(&press(KeyCode::Backspace, KeyModifiers::NONE))
        );
    }

    #[test]
    fn test_sparse_bindings_are_completed() {
        let json = r#"{ "content": { "nextPage": { "runes": ["l"] } } }"#;
        let loaded: KeyBindings = serde_json::from_str(json).unwrap();
        let keys = loaded.completed();
        assert_eq!(keys.content.next_page.runes, vec!["l".to_string()]);
        assert_eq!(keys.content.next_page.description, "Next page");
        assert_eq!(keys.content.previous_page, KeyBindings::defaults().content.previous_page);
        assert_eq!(keys.help, KeyBindings::defaults().help);
    }

    #[test]
    fn test_label_lists_keys_then_runes() {
        let keys = KeyBindings::defaults();
        assert_eq!(keys.content.peek_document.label(), "Enter, p");
    }

    #[test]
    fn test_keys_for_input_bars_share_a_section() {
        let keys = KeyBindings::defaults();
        let query = keys.keys_for(&id::QUERY_BAR).unwrap();
        let filter = keys.keys_for(&id::FILTER_BAR).unwrap();
        assert_eq!(query, filter);
        assert_eq!(query.element, "InputBar");
        assert!(keys.keys_for(&id::HEADER).is_none());
    }

    #[test]
    fn test_all_keys_starts_with_global() {
        let sections = KeyBindings::defaults().all_keys();
        assert_eq!(sections.len(), 9);
        assert_eq!(sections[0].element, "Global");
    }
}
