//! # Style Picker Component
//!
//! Overlay for switching the color style at runtime. Lists the built-in
//! styles plus every `*.toml` in the styles directory; the active one is
//! marked with `*`.

use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, List, ListItem, ListState};

use crate::config::{KeyBindings, Styles};
use crate::core::{
    App, AppError, ComponentId, Event, EventSubscriber, HandlerError, Initializable, id,
};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use super::{centered_rect, overlay_block, truncate_str};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylePickerEvent {
    Select(String),
    Close,
}

#[derive(Default)]
pub struct StylePicker {
    names: Vec<String>,
    current: String,
    selected: usize,
    list_state: ListState,
    styles: Arc<Styles>,
    keys: Arc<KeyBindings>,
}

impl StylePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the list, highlighting the active style.
    pub fn set_names(&mut self, names: Vec<String>, current: &str) {
        self.selected = names.iter().position(|n| n == current).unwrap_or(0);
        self.names = names;
        self.current = current.to_string();
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The active style changed.
    pub fn set_current(&mut self, current: &str) {
        self.current = current.to_string();
    }
}

impl Component for StylePicker {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(40, 50, area);
        frame.render_widget(Clear, overlay);

        let theme = &self.styles.overlay;
        let block = overlay_block(" Styles ", &self.styles)
            .title_bottom(Line::from(" Enter Apply  Esc Back ").centered());
        let width = overlay.width.saturating_sub(4) as usize;

        let items: Vec<ListItem> = self
            .names
            .iter()
            .map(|name| {
                let marker = if *name == self.current { " *" } else { "" };
                ListItem::new(Line::from(Span::raw(format!(
                    "{}{marker}",
                    truncate_str(name, width)
                ))))
            })
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

impl EventHandler for StylePicker {
    type Event = StylePickerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<StylePickerEvent> {
        let TuiEvent::Key(key) = event else {
            return None;
        };
        let bindings = &self.keys.style_picker;
        if bindings.close.matches(key) {
            return Some(StylePickerEvent::Close);
        }
        if bindings.select.matches(key) {
            return self
                .names
                .get(self.selected)
                .map(|name| StylePickerEvent::Select(name.clone()));
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1).min(self.names.len().saturating_sub(1));
            }
            _ => {}
        }
        None
    }
}

impl Initializable for StylePicker {
    fn init(&mut self, app: &App) -> Result<(), AppError> {
        self.styles = app.styles();
        self.keys = app.keys();
        self.set_names(app.style_names(), &app.config().current_style);
        Ok(())
    }
}

impl EventSubscriber for StylePicker {
    fn id(&self) -> ComponentId {
        id::STYLE_PICKER
    }

    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError> {
        match event {
            Event::StyleChanged(styles) => self.styles = Arc::clone(styles),
            Event::KeysChanged(keys) => self.keys = Arc::clone(keys),
            _ => {}
        }
        Ok(())
    }
}
