//! # Styles
//!
//! Colors and symbols for every component. A style file may be sparse;
//! missing entries fall back to the built-in `default` style.

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use super::merge::{Merge, merge_fields};

/// A color as written in a style file: a name (`"cyan"`), an index
/// (`"208"`) or a hex triplet (`"#1e1e2e"`).
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StyleColor(pub String);

impl StyleColor {
    fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    /// Unparseable values render with the terminal's default color.
    pub fn color(&self) -> Color {
        self.0.parse().unwrap_or(Color::Reset)
    }
}

impl Merge for StyleColor {
    fn merge_defaults(&mut self, defaults: &Self) {
        self.0.merge_defaults(&defaults.0);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Styles {
    pub global: GlobalStyle,
    pub header: HeaderStyle,
    pub databases: DatabasesStyle,
    pub content: ContentStyle,
    pub doc_peeker: DocPeekerStyle,
    pub input_bar: InputBarStyle,
    pub overlay: OverlayStyle,
    /// Set from `better_symbols` in config.toml, never read from style files.
    #[serde(skip)]
    pub better_symbols: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalStyle {
    pub background: StyleColor,
    pub text: StyleColor,
    pub secondary_text: StyleColor,
    pub border: StyleColor,
    pub focus: StyleColor,
    pub title: StyleColor,
    pub error: StyleColor,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderStyle {
    pub key: StyleColor,
    pub value: StyleColor,
    pub active: StyleColor,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabasesStyle {
    pub database: StyleColor,
    pub collection: StyleColor,
    pub selected: StyleColor,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentStyle {
    pub row: StyleColor,
    pub selected_row: StyleColor,
    pub pager: StyleColor,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DocPeekerStyle {
    pub key: StyleColor,
    pub value: StyleColor,
    pub bracket: StyleColor,
    pub title: StyleColor,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputBarStyle {
    pub label: StyleColor,
    pub input: StyleColor,
    pub suggestion: StyleColor,
    pub suggestion_selected: StyleColor,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub border: StyleColor,
    pub title: StyleColor,
    pub text: StyleColor,
    pub selected: StyleColor,
}

merge_fields!(Styles {
    global,
    header,
    databases,
    content,
    doc_peeker,
    input_bar,
    overlay,
});
merge_fields!(GlobalStyle { background, text, secondary_text, border, focus, title, error });
merge_fields!(HeaderStyle { key, value, active });
merge_fields!(DatabasesStyle { database, collection, selected });
merge_fields!(ContentStyle { row, selected_row, pager });
merge_fields!(DocPeekerStyle { key, value, bracket, title });
merge_fields!(InputBarStyle { label, input, suggestion, suggestion_selected });
merge_fields!(OverlayStyle { border, title, text, selected });

/// Glyphs for the collection tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbols {
    pub database_open: &'static str,
    pub database_closed: &'static str,
    pub collection: &'static str,
}

pub const BUILTIN_STYLES: &[&str] = &["default", "light"];

impl Styles {
    /// A style shipped with the binary, if `name` is one.
    pub fn builtin(name: &str) -> Option<Self> {
        let c = StyleColor::new;
        let styles = match name {
            "default" => Self {
                global: GlobalStyle {
                    background: c("reset"),
                    text: c("white"),
                    secondary_text: c("gray"),
                    border: c("darkgray"),
                    focus: c("cyan"),
                    title: c("lightcyan"),
                    error: c("lightred"),
                },
                header: HeaderStyle {
                    key: c("gray"),
                    value: c("lightyellow"),
                    active: c("lightgreen"),
                },
                databases: DatabasesStyle {
                    database: c("lightblue"),
                    collection: c("white"),
                    selected: c("cyan"),
                },
                content: ContentStyle {
                    row: c("white"),
                    selected_row: c("cyan"),
                    pager: c("gray"),
                },
                doc_peeker: DocPeekerStyle {
                    key: c("lightblue"),
                    value: c("lightgreen"),
                    bracket: c("gray"),
                    title: c("lightcyan"),
                },
                input_bar: InputBarStyle {
                    label: c("lightyellow"),
                    input: c("white"),
                    suggestion: c("gray"),
                    suggestion_selected: c("cyan"),
                },
                overlay: OverlayStyle {
                    border: c("darkgray"),
                    title: c("lightcyan"),
                    text: c("gray"),
                    selected: c("white"),
                },
                better_symbols: false,
            },
            "light" => Self {
                global: GlobalStyle {
                    background: c("#fafafa"),
                    text: c("black"),
                    secondary_text: c("#5c5c5c"),
                    border: c("#a0a0a0"),
                    focus: c("blue"),
                    title: c("#005f87"),
                    error: c("red"),
                },
                header: HeaderStyle {
                    key: c("#5c5c5c"),
                    value: c("#875f00"),
                    active: c("green"),
                },
                databases: DatabasesStyle {
                    database: c("blue"),
                    collection: c("black"),
                    selected: c("magenta"),
                },
                content: ContentStyle {
                    row: c("black"),
                    selected_row: c("blue"),
                    pager: c("#5c5c5c"),
                },
                doc_peeker: DocPeekerStyle {
                    key: c("blue"),
                    value: c("#005f00"),
                    bracket: c("#5c5c5c"),
                    title: c("#005f87"),
                },
                input_bar: InputBarStyle {
                    label: c("#875f00"),
                    input: c("black"),
                    suggestion: c("#5c5c5c"),
                    suggestion_selected: c("blue"),
                },
                overlay: OverlayStyle {
                    border: c("#a0a0a0"),
                    title: c("#005f87"),
                    text: c("#5c5c5c"),
                    selected: c("black"),
                },
                better_symbols: false,
            },
            _ => return None,
        };
        Some(styles)
    }

    /// Complete a sparse style from the built-in default.
    pub fn completed(mut self) -> Self {
        if let Some(defaults) = Self::builtin("default") {
            self.merge_defaults(&defaults);
        }
        self
    }

    pub fn symbols(&self) -> Symbols {
        if self.better_symbols {
            Symbols {
                database_open: "📂",
                database_closed: "📁",
                collection: "🗂",
            }
        } else {
            Symbols {
                database_open: "▾",
                database_closed: "▸",
                collection: "•",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parsing() {
        assert_eq!(StyleColor::new("cyan").color(), Color::Cyan);
        assert_eq!(StyleColor::new("#ff0000").color(), Color::Rgb(255, 0, 0));
        assert_eq!(StyleColor::new("not-a-color").color(), Color::Reset);
    }

    #[test]
    fn test_sparse_style_is_completed_from_default() {
        let toml_str = r#"
[doc_peeker]
key = "magenta"
"#;
        let loaded: Styles = toml::from_str(toml_str).unwrap();
        let styles = loaded.completed();
        assert_eq!(styles.doc_peeker.key.color(), Color::Magenta);
        let defaults = Styles::builtin("default").unwrap();
        assert_eq!(styles.doc_peeker.value, defaults.doc_peeker.value);
        assert_eq!(styles.global, defaults.global);
    }

    #[test]
    fn test_builtins_are_complete() {
        for name in BUILTIN_STYLES {
            let style = Styles::builtin(name).unwrap();
            assert_eq!(style.clone().completed(), style);
        }
        assert!(Styles::builtin("nope").is_none());
    }

    #[test]
    fn test_better_symbols_switch_glyphs() {
        let mut styles = Styles::builtin("default").unwrap();
        assert_eq!(styles.symbols().database_closed, "▸");
        styles.better_symbols = true;
        assert_eq!(styles.symbols().database_closed, "📁");
    }
}
