//! # Content Component
//!
//! A page of documents from the open collection, one compact JSON line each.
//!
//! Content owns the current [`Query`]. Opening a collection, accepting a
//! filter or paging produces a new query which the dispatcher sends to the
//! store. Only the page answering the current query is shown, so a slow
//! answer to an older query never overwrites a newer one.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};

use crate::config::{KeyBindings, Styles};
use crate::core::{
    App, AppError, ComponentId, DataChange, Event, EventSubscriber, HandlerError, Initializable,
    Query, id,
};
use crate::store::{Document, has_id, id_of};
use crate::tui::component::{Component, ErrorSink, EventHandler};
use crate::tui::event::TuiEvent;

use super::{panel, truncate_str};

#[derive(Debug, Clone, PartialEq)]
pub enum ContentEvent {
    /// Fetch the page described by the query.
    Load(Query),
    Peek {
        db: String,
        coll: String,
        document: Document,
    },
    Edit {
        db: String,
        coll: String,
        document: Document,
    },
    Add {
        db: String,
        coll: String,
    },
    ToggleQuery,
}

pub struct Content {
    query: Option<Query>,
    documents: Vec<Document>,
    total: u64,
    selected: usize,
    list_state: ListState,
    page_size: u64,
    loading: bool,
    focused: bool,
    error: Option<String>,
    styles: Arc<Styles>,
    keys: Arc<KeyBindings>,
}

impl Content {
    pub fn new(page_size: u64) -> Self {
        Self {
            query: None,
            documents: Vec::new(),
            total: 0,
            selected: 0,
            list_state: ListState::default(),
            page_size: page_size.max(1),
            loading: false,
            focused: false,
            error: None,
            styles: Arc::default(),
            keys: Arc::default(),
        }
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn selected_document(&self) -> Option<&Document> {
        self.documents.get(self.selected)
    }

    /// Start over on `db.coll` with no filter.
    pub fn open_collection(&mut self, db: &str, coll: &str) -> Query {
        self.documents.clear();
        self.total = 0;
        self.selected = 0;
        self.request(Query {
            db: db.to_string(),
            coll: coll.to_string(),
            filter: String::new(),
            skip: 0,
            limit: self.page_size,
        })
    }

    /// Filter the open collection from its first page.
    pub fn set_filter(&mut self, filter: &str) -> Option<Query> {
        let mut query = self.query.clone()?;
        query.filter = filter.trim().to_string();
        query.skip = 0;
        Some(self.request(query))
    }

    pub fn next_page(&mut self) -> Option<Query> {
        let mut query = self.query.clone()?;
        if query.skip + query.limit >= self.total {
            return None;
        }
        query.skip += query.limit;
        Some(self.request(query))
    }

    pub fn previous_page(&mut self) -> Option<Query> {
        let mut query = self.query.clone()?;
        if query.skip == 0 {
            return None;
        }
        query.skip = query.skip.saturating_sub(query.limit);
        Some(self.request(query))
    }

    pub fn refresh(&mut self) -> Option<Query> {
        let query = self.query.clone()?;
        Some(self.request(query))
    }

    fn request(&mut self, query: Query) -> Query {
        self.query = Some(query.clone());
        self.loading = true;
        self.error = None;
        query
    }

    fn located(&self, db: &str, coll: &str) -> bool {
        self.query.as_ref().is_some_and(|q| q.is_for(db, coll))
    }

    /// Swap in a fresh copy of a listed document, matched by `_id`.
    fn replace(&mut self, document: &Document) -> bool {
        let Some(id) = id_of(document) else {
            return false;
        };
        match self.documents.iter_mut().find(|d| has_id(d, id)) {
            Some(slot) => {
                *slot = document.clone();
                true
            }
            None => false,
        }
    }

    fn on_data(&mut self, change: &DataChange) {
        match change {
            DataChange::Documents { query, page, .. } => {
                if self.query.as_ref() != Some(query) {
                    log::debug!("Dropping stale page for {}.{}", query.db, query.coll);
                    return;
                }
                self.documents = page.documents.clone();
                self.total = page.total;
                self.loading = false;
                self.selected = self.selected.min(self.documents.len().saturating_sub(1));
            }
            DataChange::Document { db, coll, document } if self.located(db, coll) => {
                self.replace(document);
            }
            DataChange::DocumentSaved {
                db,
                coll,
                document,
                created,
            } if self.located(db, coll) => {
                if *created {
                    self.total += 1;
                    if (self.documents.len() as u64) < self.page_size {
                        self.documents.push(document.clone());
                    }
                } else {
                    self.replace(document);
                }
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Option<ContentEvent> {
        let keys = Arc::clone(&self.keys);
        let bindings = &keys.content;
        let (db, coll) = match &self.query {
            Some(q) => (q.db.clone(), q.coll.clone()),
            None => return None,
        };

        if bindings.toggle_query.matches(key) {
            return Some(ContentEvent::ToggleQuery);
        }
        if bindings.add_document.matches(key) {
            return Some(ContentEvent::Add { db, coll });
        }
        if bindings.peek_document.matches(key) {
            let document = self.selected_document()?.clone();
            return Some(ContentEvent::Peek { db, coll, document });
        }
        if bindings.edit_document.matches(key) {
            let document = self.selected_document()?.clone();
            return Some(ContentEvent::Edit { db, coll, document });
        }
        if bindings.next_page.matches(key) {
            return self.next_page().map(ContentEvent::Load);
        }
        if bindings.previous_page.matches(key) {
            return self.previous_page().map(ContentEvent::Load);
        }
        if bindings.refresh.matches(key) {
            return self.refresh().map(ContentEvent::Load);
        }

        let last = self.documents.len().saturating_sub(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.selected = (self.selected + 1).min(last),
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => self.selected = last,
            _ => {}
        }
        None
    }

    fn pager(&self) -> String {
        match &self.query {
            Some(_) if self.loading => " loading... ".to_string(),
            Some(q) if self.total > 0 => {
                let last = (q.skip + self.documents.len() as u64).min(self.total);
                format!(" {}-{} of {} ", q.skip + 1, last, self.total)
            }
            _ => String::new(),
        }
    }
}

impl Component for Content {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let title = match &self.query {
            Some(q) if q.filter.is_empty() => format!(" {}.{} ", q.db, q.coll),
            Some(q) => format!(" {}.{} {} ", q.db, q.coll, q.filter),
            None => " Content ".to_string(),
        };
        let pager = self.pager();
        let block = panel(&title, self.focused, &self.styles).title_bottom(
            Line::from(Span::styled(
                pager,
                Style::default().fg(self.styles.content.pager.color()),
            ))
            .right_aligned(),
        );

        let placeholder = if let Some(error) = &self.error {
            Some((error.clone(), self.styles.global.error.color()))
        } else if self.query.is_none() {
            Some((
                "Select a collection".to_string(),
                self.styles.global.secondary_text.color(),
            ))
        } else if self.documents.is_empty() && !self.loading {
            Some((
                "No documents".to_string(),
                self.styles.global.secondary_text.color(),
            ))
        } else {
            None
        };
        if let Some((text, color)) = placeholder {
            let paragraph = Paragraph::new(text)
                .style(Style::default().fg(color))
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let width = area.width.saturating_sub(2) as usize;
        let row = Style::default().fg(self.styles.content.row.color());
        let items: Vec<ListItem> = self
            .documents
            .iter()
            .map(|doc| {
                let text = serde_json::to_string(doc).unwrap_or_default();
                ListItem::new(Line::from(Span::styled(truncate_str(&text, width), row)))
            })
            .collect();

        let highlight = Style::default()
            .fg(self.styles.content.selected_row.color())
            .add_modifier(if self.focused {
                Modifier::REVERSED
            } else {
                Modifier::BOLD
            });
        let list = List::new(items).block(block).highlight_style(highlight);
        self.list_state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}

impl EventHandler for Content {
    type Event = ContentEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<ContentEvent> {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            _ => None,
        }
    }
}

impl ErrorSink for Content {
    fn show_error(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }
}

impl Initializable for Content {
    fn init(&mut self, app: &App) -> Result<(), AppError> {
        self.styles = app.styles();
        self.keys = app.keys();
        self.page_size = app.config().page_size.max(1);
        Ok(())
    }
}

impl EventSubscriber for Content {
    fn id(&self) -> ComponentId {
        id::CONTENT
    }

    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError> {
        match event {
            Event::FocusChanged(focus) => self.focused = *focus == id::CONTENT,
            Event::StyleChanged(styles) => self.styles = Arc::clone(styles),
            Event::KeysChanged(keys) => self.keys = Arc::clone(keys),
            Event::DataChanged(change) => self.on_data(change),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentPage;
    use crate::tui::components::test_helpers::{contains, render_lines};
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn doc(id: u64, name: &str) -> Document {
        match json!({"_id": id, "name": name}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn content() -> Content {
        let mut content = Content::new(2);
        content.keys = Arc::new(KeyBindings::defaults());
        content
    }

    fn deliver(content: &mut Content, query: Query, documents: Vec<Document>, total: u64) {
        content
            .on_event(&Event::DataChanged(DataChange::Documents {
                query,
                page: DocumentPage { documents, total },
                keys: Vec::new(),
            }))
            .unwrap();
    }

    fn press(content: &mut Content, c: char) -> Option<ContentEvent> {
        content.handle_event(&TuiEvent::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::NONE,
        )))
    }

    #[test]
    fn test_open_then_page_forward_and_back() {
        let mut content = content();
        let first = content.open_collection("shop", "orders");
        assert_eq!((first.skip, first.limit), (0, 2));
        assert!(content.is_loading());
        deliver(&mut content, first, vec![doc(1, "a"), doc(2, "b")], 3);
        assert!(!content.is_loading());

        let Some(ContentEvent::Load(second)) = press(&mut content, 'n') else {
            panic!("expected a load");
        };
        assert_eq!(second.skip, 2);
        deliver(&mut content, second, vec![doc(3, "c")], 3);
        assert_eq!(press(&mut content, 'n'), None);

        let Some(ContentEvent::Load(back)) = press(&mut content, 'b') else {
            panic!("expected a load");
        };
        assert_eq!(back.skip, 0);
    }

    #[test]
    fn test_stale_pages_are_ignored() {
        let mut content = content();
        let old = content.open_collection("shop", "orders");
        let new = content.set_filter("{\"name\": \"a\"}").unwrap();
        assert_eq!(new.filter, "{\"name\": \"a\"}");

        deliver(&mut content, old, vec![doc(1, "a"), doc(2, "b")], 2);
        assert!(content.documents().is_empty());
        assert!(content.is_loading());

        deliver(&mut content, new, vec![doc(1, "a")], 1);
        assert_eq!(content.documents().len(), 1);
    }

    #[test]
    fn test_set_filter_without_collection() {
        let mut content = content();
        assert_eq!(content.set_filter("{}"), None);
        assert_eq!(press(&mut content, '/'), None);
    }

    #[test]
    fn test_saved_document_updates_in_place() {
        let mut content = content();
        let query = content.open_collection("shop", "orders");
        deliver(&mut content, query, vec![doc(1, "a")], 1);

        content
            .on_event(&Event::DataChanged(DataChange::DocumentSaved {
                db: "shop".to_string(),
                coll: "orders".to_string(),
                document: doc(1, "renamed"),
                created: false,
            }))
            .unwrap();
        assert_eq!(content.documents()[0]["name"], "renamed");

        content
            .on_event(&Event::DataChanged(DataChange::DocumentSaved {
                db: "shop".to_string(),
                coll: "orders".to_string(),
                document: doc(9, "new"),
                created: true,
            }))
            .unwrap();
        assert_eq!(content.documents().len(), 2);
        assert_eq!(content.total(), 2);

        content
            .on_event(&Event::DataChanged(DataChange::DocumentSaved {
                db: "shop".to_string(),
                coll: "customers".to_string(),
                document: doc(1, "elsewhere"),
                created: false,
            }))
            .unwrap();
        assert_eq!(content.documents()[0]["name"], "renamed");
    }

    #[test]
    fn test_replace_matches_id_type() {
        let mut content = content();
        let query = content.open_collection("shop", "orders");
        let string_id = match json!({"_id": "1", "name": "text"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        deliver(&mut content, query, vec![doc(1, "number"), string_id], 2);

        let edited = match json!({"_id": "1", "name": "edited"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        content
            .on_event(&Event::DataChanged(DataChange::DocumentSaved {
                db: "shop".to_string(),
                coll: "orders".to_string(),
                document: edited,
                created: false,
            }))
            .unwrap();
        assert_eq!(content.documents()[0]["name"], "number");
        assert_eq!(content.documents()[1]["name"], "edited");
    }

    #[test]
    fn test_peek_edit_add_carry_location() {
        let mut content = content();
        let query = content.open_collection("shop", "orders");
        deliver(&mut content, query, vec![doc(1, "a"), doc(2, "b")], 2);
        content.handle_event(&TuiEvent::Key(KeyEvent::new(KeyCode::Down, KeyModifiers::NONE)));

        match press(&mut content, 'p') {
            Some(ContentEvent::Peek { db, document, .. }) => {
                assert_eq!(db, "shop");
                assert_eq!(document["_id"], 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(press(&mut content, 'E'), Some(ContentEvent::Edit { .. })));
        assert_eq!(
            press(&mut content, 'A'),
            Some(ContentEvent::Add {
                db: "shop".to_string(),
                coll: "orders".to_string()
            })
        );
        assert_eq!(press(&mut content, '/'), Some(ContentEvent::ToggleQuery));
    }

    #[test]
    fn test_error_and_render() {
        let mut content = content();
        content.styles = Arc::new(Styles::builtin("default").unwrap());
        assert!(contains(&render_lines(&mut content, 40, 5), "Select a collection"));

        let query = content.open_collection("shop", "orders");
        deliver(&mut content, query, vec![doc(1, "alice")], 1);
        let lines = render_lines(&mut content, 60, 5);
        assert!(contains(&lines, "shop.orders"));
        assert!(contains(&lines, "alice"));
        assert!(contains(&lines, "1-1 of 1"));

        content.show_error("invalid filter: expected value".to_string());
        assert!(!content.is_loading());
        assert!(contains(&render_lines(&mut content, 60, 5), "invalid filter"));
    }
}
