//! # History Modal
//!
//! Overlay listing past queries, newest first. Accepting an entry puts it
//! back in the query bar. The history itself is loaded when the component
//! is registered and written back on every change.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use log::warn;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Clear, List, ListItem, ListState, Paragraph};

use crate::config::{KeyBindings, Styles};
use crate::core::{
    App, AppError, ComponentId, Event, EventSubscriber, HandlerError, Initializable, id,
};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;
use crate::tui::history::History;

use super::{centered_rect, overlay_block, truncate_str};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    Accept(String),
    Close,
}

#[derive(Default)]
pub struct HistoryModal {
    history: Option<History>,
    selected: usize,
    list_state: ListState,
    error: Option<String>,
    styles: Arc<Styles>,
    keys: Arc<KeyBindings>,
}

impl HistoryModal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> Vec<&str> {
        match &self.history {
            Some(history) => history.entries().iter().rev().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }

    /// Remember an accepted query.
    pub fn record(&mut self, text: &str) {
        let Some(history) = self.history.as_mut() else {
            return;
        };
        if let Err(e) = history.record(text) {
            warn!("Failed to save history to {}: {}", history.path().display(), e);
            self.error = Some(format!("history not saved: {e}"));
        }
        self.selected = 0;
    }

    fn clear(&mut self) {
        let Some(history) = self.history.as_mut() else {
            return;
        };
        if let Err(e) = history.clear() {
            warn!("Failed to clear history {}: {}", history.path().display(), e);
            self.error = Some(format!("history not cleared: {e}"));
        }
        self.selected = 0;
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Option<HistoryEvent> {
        let keys = Arc::clone(&self.keys);
        let bindings = &keys.history;
        if bindings.close_history.matches(key) {
            return Some(HistoryEvent::Close);
        }
        if bindings.accept_entry.matches(key) {
            return self
                .entries()
                .get(self.selected)
                .map(|entry| HistoryEvent::Accept(entry.to_string()));
        }
        if bindings.clear_history.matches(key) {
            self.clear();
            return None;
        }

        let last = self.entries().len().saturating_sub(1);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.selected = (self.selected + 1).min(last),
            _ => {}
        }
        None
    }
}

impl Component for HistoryModal {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(60, 50, area);
        frame.render_widget(Clear, overlay);

        let theme = &self.styles.overlay;
        let block = overlay_block(" Query History ", &self.styles)
            .title_bottom(Line::from(" Enter Accept  C Clear  Esc Back ").centered());

        let entries = self.entries();
        if entries.is_empty() || self.error.is_some() {
            let (text, color) = match &self.error {
                Some(error) => (error.clone(), self.styles.global.error.color()),
                None => ("No history yet".to_string(), theme.text.color()),
            };
            frame.render_widget(
                Paragraph::new(text).style(Style::default().fg(color)).block(block),
                overlay,
            );
            return;
        }

        let width = overlay.width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| ListItem::new(truncate_str(entry, width)))
            .collect();
        let list = List::new(items)
            .style(Style::default().fg(theme.text.color()))
            .highlight_style(
                Style::default()
                    .fg(theme.selected.color())
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            )
            .block(block);
        self.list_state.select(Some(self.selected));
        frame.render_stateful_widget(list, overlay, &mut self.list_state);
    }
}

impl EventHandler for HistoryModal {
    type Event = HistoryEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<HistoryEvent> {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            _ => None,
        }
    }
}

impl Initializable for HistoryModal {
    fn init(&mut self, app: &App) -> Result<(), AppError> {
        let config = app.config();
        self.history = Some(History::load(&config.history_path, config.history_limit));
        self.styles = app.styles();
        self.keys = app.keys();
        Ok(())
    }
}

impl EventSubscriber for HistoryModal {
    fn id(&self) -> ComponentId {
        id::HISTORY
    }

    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError> {
        match event {
            Event::StyleChanged(styles) => self.styles = Arc::clone(styles),
            Event::KeysChanged(keys) => self.keys = Arc::clone(keys),
            Event::FocusChanged(focus) if *focus == id::HISTORY => self.error = None,
            _ => {}
        }
        Ok(())
    }
}
