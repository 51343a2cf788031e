//! # DocPeeker Component
//!
//! Full-screen overlay showing one document as indented, highlighted JSON.
//! Scrolls with the arrow keys, `g`/`G` and PageUp/PageDown. The document can
//! be re-read from the store or opened in the external editor from here.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph};
use serde_json::Value;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::config::{KeyBindings, Styles};
use crate::core::{
    App, AppError, ComponentId, DataChange, Event, EventSubscriber, HandlerError, Initializable,
    id,
};
use crate::store::Document;
use crate::tui::component::{Component, ErrorSink, EventHandler};
use crate::tui::event::TuiEvent;

use super::{centered_rect, overlay_block};

#[derive(Debug, Clone, PartialEq)]
pub enum PeekerEvent {
    /// Re-read the document with this `_id`.
    Refresh { db: String, coll: String, id: Value },
    Edit {
        db: String,
        coll: String,
        document: Document,
    },
    Close,
}

#[derive(Default)]
pub struct DocPeeker {
    db: String,
    coll: String,
    document: Option<Document>,
    scroll_state: ScrollViewState,
    content_height: u16,
    viewport_height: u16,
    error: Option<String>,
    styles: Arc<Styles>,
    keys: Arc<KeyBindings>,
}

impl DocPeeker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `document` from the top.
    pub fn peek(&mut self, db: &str, coll: &str, document: Document) {
        self.db = db.to_string();
        self.coll = coll.to_string();
        self.document = Some(document);
        self.error = None;
        self.scroll_state.set_offset(Position::ORIGIN);
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn offset(&self) -> u16 {
        self.scroll_state.offset().y
    }

    fn id_value(&self) -> Option<Value> {
        self.document.as_ref()?.get("_id").cloned()
    }

    /// Take a fresh copy if it is the document on screen.
    fn update(&mut self, db: &str, coll: &str, document: &Document) {
        if db != self.db || coll != self.coll {
            return;
        }
        if self.id_value().is_some() && self.id_value().as_ref() == document.get("_id") {
            self.document = Some(document.clone());
            self.error = None;
        }
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Option<PeekerEvent> {
        let keys = Arc::clone(&self.keys);
        let bindings = &keys.doc_peeker;
        if bindings.close.matches(key) {
            return Some(PeekerEvent::Close);
        }
        if bindings.refresh.matches(key) {
            return self.id_value().map(|id| PeekerEvent::Refresh {
                db: self.db.clone(),
                coll: self.coll.clone(),
                id,
            });
        }
        if bindings.edit.matches(key) {
            return self.document.clone().map(|document| PeekerEvent::Edit {
                db: self.db.clone(),
                coll: self.coll.clone(),
                document,
            });
        }
        if bindings.move_to_top.matches(key) {
            self.scroll_state.set_offset(Position::ORIGIN);
            return None;
        }
        if bindings.move_to_bottom.matches(key) {
            self.scroll_state.set_offset(Position::new(0, self.max_offset()));
            return None;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_state.scroll_up(),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_state.scroll_down(),
            KeyCode::PageUp => self.scroll_state.scroll_page_up(),
            KeyCode::PageDown => self.scroll_state.scroll_page_down(),
            _ => {}
        }
        None
    }
}

/// Pretty JSON split into colored lines: keys, values and brackets.
///
/// Only members of an object have a key. The open containers are tracked
/// line by line so array elements that look like `"a": b` stay values.
pub fn highlight(document: &Document, styles: &Styles) -> Vec<Line<'static>> {
    let theme = &styles.doc_peeker;
    let key = Style::default().fg(theme.key.color());
    let value = Style::default().fg(theme.value.color());
    let bracket = Style::default().fg(theme.bracket.color());

    let text = serde_json::to_string_pretty(document).unwrap_or_default();
    let mut containers: Vec<char> = Vec::new();
    text.lines()
        .map(|line| {
            let body = line.trim_start();
            let indent = &line[..line.len() - body.len()];
            let mut spans = vec![Span::raw(indent.to_string())];

            if body.starts_with(['}', ']']) {
                containers.pop();
            }
            let member_key = match containers.last() {
                Some('{') => string_end(body).filter(|end| body[*end..].starts_with(": ")),
                _ => None,
            };
            let rest = match member_key {
                Some(end) => {
                    spans.push(Span::styled(body[..end].to_string(), key));
                    spans.push(Span::styled(": ", bracket));
                    &body[end + 2..]
                }
                None => body,
            };
            let (rest, comma) = match rest.strip_suffix(',') {
                Some(stripped) => (stripped, ","),
                None => (rest, ""),
            };
            if rest.ends_with('{') {
                containers.push('{');
            } else if rest.ends_with('[') {
                containers.push('[');
            }

            let style = if matches!(rest, "{" | "}" | "[" | "]" | "{}" | "[]") {
                bracket
            } else {
                value
            };
            spans.push(Span::styled(rest.to_string(), style));
            if !comma.is_empty() {
                spans.push(Span::styled(comma, bracket));
            }
            Line::from(spans)
        })
        .collect()
}

/// Byte offset just past the JSON string that opens `text`.
fn string_end(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'"') {
        return None;
    }
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

impl Component for DocPeeker {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 80, area);
        frame.render_widget(Clear, overlay);

        let title = match self.id_value() {
            Some(id) => format!(" {}.{} {} ", self.db, self.coll, id),
            None => format!(" {}.{} ", self.db, self.coll),
        };
        let block = overlay_block(&title, &self.styles);
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        if let Some(error) = &self.error {
            let paragraph = Paragraph::new(error.as_str())
                .style(Style::default().fg(self.styles.global.error.color()));
            frame.render_widget(paragraph, inner);
            return;
        }

        let lines = match &self.document {
            Some(document) => highlight(document, &self.styles),
            None => Vec::new(),
        };
        let width = inner.width.saturating_sub(1);
        self.content_height = lines.len() as u16;
        self.viewport_height = inner.height;

        let offset = self.scroll_state.offset();
        if offset.y > self.max_offset() {
            self.scroll_state
                .set_offset(Position::new(offset.x, self.max_offset()));
        }

        let mut scroll_view = ScrollView::new(Size::new(width, self.content_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);
        scroll_view.render_widget(
            Paragraph::new(lines),
            Rect::new(0, 0, width, self.content_height),
        );
        frame.render_stateful_widget(scroll_view, inner, &mut self.scroll_state);
    }
}

impl EventHandler for DocPeeker {
    type Event = PeekerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<PeekerEvent> {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            _ => None,
        }
    }
}

impl ErrorSink for DocPeeker {
    fn show_error(&mut self, message: String) {
        self.error = Some(message);
    }
}

impl Initializable for DocPeeker {
    fn init(&mut self, app: &App) -> Result<(), AppError> {
        self.styles = app.styles();
        self.keys = app.keys();
        Ok(())
    }
}

impl EventSubscriber for DocPeeker {
    fn id(&self) -> ComponentId {
        id::DOC_PEEKER
    }

    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError> {
        match event {
            Event::StyleChanged(styles) => self.styles = Arc::clone(styles),
            Event::KeysChanged(keys) => self.keys = Arc::clone(keys),
            Event::DataChanged(DataChange::Document { db, coll, document })
            | Event::DataChanged(DataChange::DocumentSaved {
                db, coll, document, ..
            }) => self.update(db, coll, document),
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::components::test_helpers::{contains, render_lines};
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn peeker() -> DocPeeker {
        let mut peeker = DocPeeker::new();
        peeker.keys = Arc::new(KeyBindings::defaults());
        peeker.styles = Arc::new(Styles::builtin("default").unwrap());
        peeker.peek("shop", "orders", doc(json!({"_id": 7, "total": 12.5})));
        peeker
    }

    fn press(peeker: &mut DocPeeker, code: KeyCode) -> Option<PeekerEvent> {
        peeker.handle_event(&TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    #[test]
    fn test_highlight_splits_keys_and_values() {
        let lines = highlight(&doc(json!({"name": "ada", "tags": []})), &Styles::default());
        assert_eq!(lines.len(), 4);
        let name: Vec<String> = lines[1].spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(name, vec!["  ", "\"name\"", ": ", "\"ada\"", ","]);
    }

    #[test]
    fn test_highlight_keeps_array_strings_as_values() {
        let document = doc(json!({"notes": ["a\": b"], "we\": ird": {"x": 1}}));
        let lines = highlight(&document, &Styles::default());
        let texts: Vec<Vec<String>> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.to_string()).collect())
            .collect();

        assert_eq!(texts[1], vec!["  ", "\"notes\"", ": ", "["]);
        assert_eq!(texts[2], vec!["    ", "\"a\\\": b\""]);
        assert_eq!(texts[3], vec!["  ", "]", ","]);
        assert_eq!(texts[4], vec!["  ", "\"we\\\": ird\"", ": ", "{"]);
        assert_eq!(texts[5], vec!["    ", "\"x\"", ": ", "1"]);
    }

    #[test]
    fn test_keys_emit_events() {
        let mut peeker = peeker();
        assert_eq!(press(&mut peeker, KeyCode::Esc), Some(PeekerEvent::Close));
        assert_eq!(
            press(&mut peeker, KeyCode::Char('R')),
            Some(PeekerEvent::Refresh {
                db: "shop".to_string(),
                coll: "orders".to_string(),
                id: json!(7)
            })
        );
        assert!(matches!(
            press(&mut peeker, KeyCode::Char('e')),
            Some(PeekerEvent::Edit { .. })
        ));
    }

    #[test]
    fn test_only_matching_document_is_replaced() {
        let mut peeker = peeker();
        peeker
            .on_event(&Event::DataChanged(DataChange::Document {
                db: "shop".to_string(),
                coll: "orders".to_string(),
                document: doc(json!({"_id": 8, "total": 1})),
            }))
            .unwrap();
        assert_eq!(peeker.document().unwrap()["total"], 12.5);

        peeker
            .on_event(&Event::DataChanged(DataChange::DocumentSaved {
                db: "shop".to_string(),
                coll: "orders".to_string(),
                document: doc(json!({"_id": 7, "total": 99})),
                created: false,
            }))
            .unwrap();
        assert_eq!(peeker.document().unwrap()["total"], 99);
    }

    #[test]
    fn test_scrolling_is_clamped_to_content() {
        let mut peeker = peeker();
        let fields: serde_json::Map<String, Value> =
            (0..40).map(|i| (format!("f{i:02}"), json!(i))).collect();
        peeker.peek("shop", "orders", fields);

        let lines = render_lines(&mut peeker, 60, 20);
        assert!(contains(&lines, "\"f00\""));

        press(&mut peeker, KeyCode::Char('G'));
        assert!(peeker.offset() > 0);
        let lines = render_lines(&mut peeker, 60, 20);
        assert!(contains(&lines, "\"f39\""));

        press(&mut peeker, KeyCode::Char('g'));
        assert_eq!(peeker.offset(), 0);
    }
}
