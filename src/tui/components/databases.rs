//! # Databases Component
//!
//! The left-hand tree of databases and their collections. Databases fold
//! open and closed; selecting a collection asks the dispatcher to open it in
//! the content view.
//!
//! Text accepted in the filter bar narrows the tree to collections whose
//! name contains it (case-insensitive). A database whose own name matches
//! keeps all its collections. While a filter is set every database is shown
//! unfolded.

use std::collections::HashSet;
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
    id,
};
use crate::store::DatabaseCollections;
use crate::tui::component::{Component, ErrorSink, EventHandler};
use crate::tui::event::TuiEvent;

use super::panel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabasesEvent {
    Open { db: String, coll: String },
    ToggleFilter,
    Refresh,
}

/// One visible line of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Database { db: String, open: bool },
    Collection { db: String, coll: String },
}

#[derive(Default)]
pub struct Databases {
    dbs: Vec<DatabaseCollections>,
    expanded: HashSet<String>,
    filter: String,
    selected: usize,
    list_state: ListState,
    focused: bool,
    error: Option<String>,
    styles: Arc<Styles>,
    keys: Arc<KeyBindings>,
}

impl Databases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Narrow the tree. Selection goes back to the first row.
    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.trim().to_string();
        self.selected = 0;
    }

    pub fn selected(&self) -> Option<Row> {
        self.rows().into_iter().nth(self.selected)
    }

    /// The visible rows, top to bottom.
    pub fn rows(&self) -> Vec<Row> {
        let needle = self.filter.to_lowercase();
        let mut rows = Vec::new();
        for entry in &self.dbs {
            let db_matches = entry.db.to_lowercase().contains(&needle);
            let collections: Vec<&String> = entry
                .collections
                .iter()
                .filter(|c| db_matches || c.to_lowercase().contains(&needle))
                .collect();
            if !db_matches && collections.is_empty() {
                continue;
            }
            let open = !needle.is_empty() || self.expanded.contains(&entry.db);
            rows.push(Row::Database {
                db: entry.db.clone(),
                open,
            });
            if open {
                rows.extend(collections.into_iter().map(|coll| Row::Collection {
                    db: entry.db.clone(),
                    coll: coll.clone(),
                }));
            }
        }
        rows
    }

    fn set_databases(&mut self, dbs: Vec<DatabaseCollections>) {
        let first_load = self.dbs.is_empty();
        self.expanded.retain(|db| dbs.iter().any(|d| d.db == *db));
        if first_load && let Some(first) = dbs.first() {
            self.expanded.insert(first.db.clone());
        }
        self.dbs = dbs;
        self.error = None;
        let len = self.rows().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn set_open(&mut self, db: &str, open: bool) {
        if open {
            self.expanded.insert(db.to_string());
        } else {
            self.expanded.remove(db);
        }
    }

    fn activate(&mut self) -> Option<DatabasesEvent> {
        match self.selected()? {
            Row::Database { db, open } => {
                self.set_open(&db, !open);
                None
            }
            Row::Collection { db, coll } => Some(DatabasesEvent::Open { db, coll }),
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Option<DatabasesEvent> {
        let keys = Arc::clone(&self.keys);
        let bindings = &keys.databases;
        if bindings.filter_bar.matches(key) {
            return Some(DatabasesEvent::ToggleFilter);
        }
        if bindings.refresh.matches(key) {
            return Some(DatabasesEvent::Refresh);
        }
        if bindings.select.matches(key) {
            return self.activate();
        }

        let len = self.rows().len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(len.saturating_sub(1));
            }
            KeyCode::Home | KeyCode::Char('g') => self.selected = 0,
            KeyCode::End | KeyCode::Char('G') => self.selected = len.saturating_sub(1),
            KeyCode::Left | KeyCode::Char('h') => match self.selected() {
                Some(Row::Database { db, .. }) => self.set_open(&db, false),
                Some(Row::Collection { db, .. }) => {
                    // Jump to the parent database and fold it.
                    self.set_open(&db, false);
                    let rows = self.rows();
                    self.selected = rows
                        .iter()
                        .position(|r| matches!(r, Row::Database { db: d, .. } if *d == db))
                        .unwrap_or(0);
                }
                None => {}
            },
            KeyCode::Right | KeyCode::Char('l') => {
                if let Some(Row::Database { db, .. }) = self.selected() {
                    self.set_open(&db, true);
                }
            }
            _ => {}
        }
        None
    }
}

impl Component for Databases {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let title = if self.filter.is_empty() {
            " Databases ".to_string()
        } else {
            format!(" Databases [{}] ", self.filter)
        };
        let block = panel(&title, self.focused, &self.styles);

        if let Some(error) = &self.error {
            let text = Paragraph::new(error.as_str())
                .style(Style::default().fg(self.styles.global.error.color()))
                .block(block);
            frame.render_widget(text, area);
            return;
        }

        let theme = &self.styles.databases;
        let symbols = self.styles.symbols();
        let items: Vec<ListItem> = self
            .rows()
            .into_iter()
            .map(|row| match row {
                Row::Database { db, open } => {
                    let glyph = if open {
                        symbols.database_open
                    } else {
                        symbols.database_closed
                    };
                    ListItem::new(Line::from(Span::styled(
                        format!("{glyph} {db}"),
                        Style::default().fg(theme.database.color()),
                    )))
                }
                Row::Collection { coll, .. } => ListItem::new(Line::from(Span::styled(
                    format!("  {} {coll}", symbols.collection),
                    Style::default().fg(theme.collection.color()),
                ))),
            })
            .collect();

        let highlight = Style::default()
            .fg(theme.selected.color())
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

impl EventHandler for Databases {
    type Event = DatabasesEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<DatabasesEvent> {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            _ => None,
        }
    }
}

impl ErrorSink for Databases {
    fn show_error(&mut self, message: String) {
        self.error = Some(message);
    }
}

impl Initializable for Databases {
    fn init(&mut self, app: &App) -> Result<(), AppError> {
        self.styles = app.styles();
        self.keys = app.keys();
        Ok(())
    }
}

impl EventSubscriber for Databases {
    fn id(&self) -> ComponentId {
        id::DATABASES
    }

    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError> {
        match event {
            Event::FocusChanged(focus) => self.focused = *focus == id::DATABASES,
            Event::StyleChanged(styles) => self.styles = Arc::clone(styles),
            Event::KeysChanged(keys) => self.keys = Arc::clone(keys),
            Event::DataChanged(DataChange::Databases(dbs)) => self.set_databases(dbs.clone()),
            Event::DataChanged(_) => {}
        }
        Ok(())
    }
}
