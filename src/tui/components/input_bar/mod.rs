//! # InputBar Component
//!
//! A single-line text input docked above a list. Two instances exist: the
//! query bar over the document list and the filter bar over the collection
//! tree.
//!
//! ## Lifecycle
//!
//! Enabling a bar shows it as a docked page, which moves focus to it.
//! Typing edits the buffer on the UI thread. Enter and Esc are not handled
//! here: they are forwarded to the bar's listener task (see [`listener`]),
//! which disables the bar under its lock and posts the outcome back to the
//! UI loop. The loop restores focus and, for Enter only, hands the text to
//! whoever opened the bar.
//!
//! ## Autocompletion
//!
//! While typing, the word under the cursor is completed from query
//! operators, `ObjectId("")` and the document keys last loaded into the
//! bar's [`InputGate`]. Tab or Enter accepts the highlighted suggestion, Esc
//! dismisses the list.

pub mod autocomplete;
pub mod gate;
pub mod listener;

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::warn;
use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, List, ListItem, Paragraph};
use tokio::sync::mpsc::UnboundedSender;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::{KeyBindings, Styles};
use crate::core::{
    App, AppError, ComponentId, DataChange, Event, EventSubscriber, HandlerError, Initializable,
    PageRequest,
};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub use gate::InputGate;
pub use listener::Terminator;

/// Suggestions shown at once.
const MAX_SUGGESTIONS: usize = 6;

/// High-level events emitted by an input bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputBarEvent {
    /// Open the history overlay for this bar.
    ShowHistory,
    /// The text changed.
    Changed,
}

pub struct InputBar {
    id: ComponentId,
    label: String,
    gate: InputGate,
    has_history: bool,
    buffer: String,
    /// Byte offset into `buffer`, always on a char boundary.
    cursor: usize,
    suggestions: Vec<String>,
    selected: usize,
    terminator: Option<UnboundedSender<Terminator>>,
    focused: bool,
    styles: Arc<Styles>,
    keys: Arc<KeyBindings>,
}

impl InputBar {
    pub fn new(id: ComponentId, label: impl Into<String>) -> Self {
        Self {
            gate: InputGate::new(id.clone()),
            id,
            label: label.into(),
            has_history: false,
            buffer: String::new(),
            cursor: 0,
            suggestions: Vec::new(),
            selected: 0,
            terminator: None,
            focused: false,
            styles: Arc::default(),
            keys: Arc::default(),
        }
    }

    /// Let Ctrl+Y (by default) open the history overlay.
    pub fn with_history(mut self) -> Self {
        self.has_history = true;
        self
    }

    /// Connect the bar to its listener task.
    pub fn attach(&mut self, terminator: UnboundedSender<Terminator>) {
        self.terminator = Some(terminator);
    }

    /// A handle on the bar's locked state, for the listener task.
    pub fn gate(&self) -> InputGate {
        self.gate.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    pub fn enable(&mut self) -> Option<PageRequest> {
        self.gate.enable()
    }

    pub fn disable(&mut self) -> Option<PageRequest> {
        self.suggestions.clear();
        self.gate.disable()
    }

    pub fn toggle(&mut self) -> PageRequest {
        self.suggestions.clear();
        self.gate.toggle()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Replace the text and put the cursor at the end.
    pub fn set_text(&mut self, text: &str) {
        self.buffer = text.replace(['\n', '\r'], " ");
        self.cursor = self.buffer.len();
        self.suggestions.clear();
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    fn popup_visible(&self) -> bool {
        !self.suggestions.is_empty()
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions = autocomplete::suggest(&self.buffer, self.cursor, &self.gate.doc_keys());
        self.suggestions.truncate(MAX_SUGGESTIONS);
        self.selected = 0;
    }

    fn accept_suggestion(&mut self) {
        if let Some(choice) = self.suggestions.get(self.selected).cloned() {
            let (text, cursor) = autocomplete::apply(&self.buffer, self.cursor, &choice);
            self.buffer = text;
            self.cursor = cursor;
        }
        self.suggestions.clear();
    }

    fn terminate(&mut self, key: Terminator) {
        self.suggestions.clear();
        match &self.terminator {
            Some(tx) => {
                if tx.send(key).is_err() {
                    warn!("{} listener is gone", self.id);
                }
            }
            None => warn!("{} has no listener attached", self.id),
        }
    }

    fn insert(&mut self, text: &str) {
        self.buffer.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.cursor)
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Option<InputBarEvent> {
        let keys = Arc::clone(&self.keys);
        let bindings = &keys.input_bar;

        if bindings.show_history.matches(key) {
            return self.has_history.then_some(InputBarEvent::ShowHistory);
        }
        if bindings.clear_input.matches(key) {
            self.clear();
            return Some(InputBarEvent::Changed);
        }

        if self.popup_visible() {
            if bindings.accept_suggestion.matches(key) || key.code == KeyCode::Enter {
                self.accept_suggestion();
                return Some(InputBarEvent::Changed);
            }
            match key.code {
                KeyCode::Up => {
                    self.selected = self.selected.saturating_sub(1);
                    return None;
                }
                KeyCode::Down => {
                    self.selected = (self.selected + 1).min(self.suggestions.len() - 1);
                    return None;
                }
                KeyCode::Esc => {
                    self.suggestions.clear();
                    return None;
                }
                _ => {}
            }
        }

        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match key.code {
            KeyCode::Enter => {
                self.terminate(Terminator::Accept(self.buffer.clone()));
                None
            }
            KeyCode::Esc => {
                self.terminate(Terminator::Cancel);
                None
            }
            KeyCode::Char(c) if plain => {
                let mut buf = [0u8; 4];
                self.insert(c.encode_utf8(&mut buf));
                self.refresh_suggestions();
                Some(InputBarEvent::Changed)
            }
            KeyCode::Backspace if self.cursor > 0 => {
                let start = self.prev_boundary();
                self.buffer.replace_range(start..self.cursor, "");
                self.cursor = start;
                self.refresh_suggestions();
                Some(InputBarEvent::Changed)
            }
            KeyCode::Delete if self.cursor < self.buffer.len() => {
                let end = self.next_boundary();
                self.buffer.replace_range(self.cursor..end, "");
                self.suggestions.clear();
                Some(InputBarEvent::Changed)
            }
            KeyCode::Left => {
                self.cursor = self.prev_boundary();
                self.suggestions.clear();
                None
            }
            KeyCode::Right => {
                self.cursor = self.next_boundary();
                self.suggestions.clear();
                None
            }
            KeyCode::Home => {
                self.cursor = 0;
                self.suggestions.clear();
                None
            }
            KeyCode::End => {
                self.cursor = self.buffer.len();
                self.suggestions.clear();
                None
            }
            _ => None,
        }
    }

    /// The tail of the buffer that fits in `width` columns with the cursor
    /// on screen, and the cursor's column within it.
    fn visible_window(&self, width: u16) -> (&str, u16) {
        let column = self.buffer[..self.cursor].width();
        let skip = column.saturating_sub(usize::from(width.saturating_sub(1)));

        let mut start = 0;
        let mut skipped = 0;
        for (i, c) in self.buffer.char_indices() {
            if skipped >= skip {
                start = i;
                break;
            }
            skipped += c.width().unwrap_or(0);
            start = i + c.len_utf8();
        }
        let offset = u16::try_from(column.saturating_sub(skipped)).unwrap_or(u16::MAX);
        (&self.buffer[start..], offset)
    }

    fn render_suggestions(&self, frame: &mut Frame, bar: Rect, cursor_x: u16) {
        let screen = frame.area();
        let width = self
            .suggestions
            .iter()
            .map(|s| u16::try_from(s.width()).unwrap_or(u16::MAX).saturating_add(2))
            .max()
            .unwrap_or(0)
            .clamp(12, screen.width);
        let height = (self.suggestions.len() as u16).min(screen.height);
        let x = cursor_x.min(screen.right().saturating_sub(width));
        let y = bar.bottom().min(screen.bottom().saturating_sub(height));
        let popup = Rect::new(x, y, width, height);

        let theme = &self.styles.input_bar;
        let items: Vec<ListItem> = self
            .suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let style = if i == self.selected {
                    Style::default()
                        .fg(theme.suggestion_selected.color())
                        .add_modifier(Modifier::REVERSED)
                } else {
                    Style::default().fg(theme.suggestion.color())
                };
                ListItem::new(Line::from(Span::styled(format!(" {s} "), style)))
            })
            .collect();

        frame.render_widget(Clear, popup);
        frame.render_widget(List::new(items), popup);
    }
}

impl Component for InputBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let global = &self.styles.global;
        let theme = &self.styles.input_bar;
        let border = if self.focused {
            global.focus.color()
        } else {
            global.border.color()
        };

        let block = Block::bordered()
            .border_style(Style::default().fg(border))
            .title(Span::styled(
                format!(" {} ", self.label),
                Style::default().fg(theme.label.color()),
            ));

        let inner_width = area.width.saturating_sub(2);
        let (visible, offset) = self.visible_window(inner_width);

        let input = Paragraph::new(visible)
            .style(Style::default().fg(theme.input.color()))
            .block(block);
        frame.render_widget(input, area);

        let cursor_x = area
            .x
            .saturating_add(1)
            .saturating_add(offset)
            .min(area.right().saturating_sub(1));
        if self.focused {
            frame.set_cursor_position(Position::new(cursor_x, area.y + 1));
        }
        if self.popup_visible() {
            self.render_suggestions(frame, area, cursor_x);
        }
    }
}

impl EventHandler for InputBar {
    type Event = InputBarEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<InputBarEvent> {
        match event {
            TuiEvent::Key(key) => self.handle_key(key),
            TuiEvent::Paste(text) => {
                self.insert(&text.replace(['\n', '\r'], " "));
                self.suggestions.clear();
                Some(InputBarEvent::Changed)
            }
            TuiEvent::Resize => None,
        }
    }
}

impl Initializable for InputBar {
    fn init(&mut self, app: &App) -> Result<(), AppError> {
        self.styles = app.styles();
        self.keys = app.keys();
        Ok(())
    }
}

impl EventSubscriber for InputBar {
    fn id(&self) -> ComponentId {
        self.id.clone()
    }

    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError> {
        match event {
            Event::FocusChanged(id) => self.focused = *id == self.id,
            Event::StyleChanged(styles) => self.styles = Arc::clone(styles),
            Event::KeysChanged(keys) => self.keys = Arc::clone(keys),
            Event::DataChanged(DataChange::Documents { keys, .. })
                if self.id == crate::core::id::QUERY_BAR =>
            {
                self.gate.load_keys(keys.clone());
            }
            Event::DataChanged(DataChange::Databases(dbs))
                if self.id == crate::core::id::FILTER_BAR =>
            {
                let mut names: Vec<String> = dbs
                    .iter()
                    .flat_map(|d| std::iter::once(&d.db).chain(d.collections.iter()))
                    .cloned()
                    .collect();
                names.sort();
                names.dedup();
                self.gate.load_keys(names);
            }
            Event::DataChanged(_) => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::id;
    use crate::store::DatabaseCollections;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn bar() -> (InputBar, UnboundedReceiver<Terminator>) {
        let mut bar = InputBar::new(id::QUERY_BAR, "Query").with_history();
        bar.keys = Arc::new(KeyBindings::defaults());
        bar.styles = Arc::new(Styles::builtin("default").unwrap());
        let (tx, rx) = listener::channel();
        bar.attach(tx);
        (bar, rx)
    }

    fn key(code: KeyCode) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> TuiEvent {
        TuiEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(bar: &mut InputBar, text: &str) {
        for c in text.chars() {
            bar.handle_event(&key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_typing_and_editing() {
        let (mut bar, _rx) = bar();
        type_text(&mut bar, "{é}");
        assert_eq!(bar.text(), "{é}");
        bar.handle_event(&key(KeyCode::Left));
        bar.handle_event(&key(KeyCode::Backspace));
        assert_eq!(bar.text(), "{}");
        bar.handle_event(&key(KeyCode::Home));
        bar.handle_event(&key(KeyCode::Delete));
        assert_eq!(bar.text(), "}");
    }

    #[test]
    fn test_enter_and_esc_go_to_listener() {
        let (mut bar, mut rx) = bar();
        type_text(&mut bar, "{}");
        assert_eq!(bar.handle_event(&key(KeyCode::Enter)), None);
        bar.handle_event(&key(KeyCode::Esc));
        assert_eq!(rx.try_recv().unwrap(), Terminator::Accept("{}".to_string()));
        assert_eq!(rx.try_recv().unwrap(), Terminator::Cancel);
    }

    #[test]
    fn test_suggestion_accepted_with_tab() {
        let (mut bar, mut rx) = bar();
        bar.gate().load_keys(vec!["name".to_string()]);
        type_text(&mut bar, "{\"na");
        assert_eq!(bar.suggestions(), ["name"]);

        bar.handle_event(&key(KeyCode::Tab));
        assert_eq!(bar.text(), "{\"name");
        assert!(bar.suggestions().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_enter_with_popup_accepts_suggestion_not_input() {
        let (mut bar, mut rx) = bar();
        type_text(&mut bar, "{\"a\": {\"$ex");
        bar.handle_event(&key(KeyCode::Enter));
        assert_eq!(bar.text(), "{\"a\": {\"$exists");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_esc_with_popup_only_hides_it() {
        let (mut bar, mut rx) = bar();
        type_text(&mut bar, "$");
        assert!(!bar.suggestions().is_empty());
        bar.handle_event(&key(KeyCode::Esc));
        assert!(bar.suggestions().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_history_and_clear_keys() {
        let (mut bar, _rx) = bar();
        type_text(&mut bar, "abc");
        assert_eq!(bar.handle_event(&ctrl('y')), Some(InputBarEvent::ShowHistory));
        assert_eq!(bar.handle_event(&ctrl('d')), Some(InputBarEvent::Changed));
        assert_eq!(bar.text(), "");

        let mut filter = InputBar::new(id::FILTER_BAR, "Filter");
        filter.keys = Arc::new(KeyBindings::defaults());
        assert_eq!(filter.handle_event(&ctrl('y')), None);
    }

    #[test]
    fn test_paste_flattens_newlines() {
        let (mut bar, _rx) = bar();
        bar.handle_event(&TuiEvent::Paste("{\n\"a\": 1\n}".to_string()));
        assert_eq!(bar.text(), "{ \"a\": 1 }");
    }

    #[test]
    fn test_focus_and_data_events() {
        let (mut bar, _rx) = bar();
        bar.on_event(&Event::FocusChanged(id::QUERY_BAR)).unwrap();
        assert!(bar.focused);
        bar.on_event(&Event::FocusChanged(id::CONTENT)).unwrap();
        assert!(!bar.focused);

        let mut filter = InputBar::new(id::FILTER_BAR, "Filter");
        filter
            .on_event(&Event::DataChanged(DataChange::Databases(vec![
                DatabaseCollections {
                    db: "shop".to_string(),
                    collections: vec!["orders".to_string()],
                },
            ])))
            .unwrap();
        assert_eq!(filter.gate().doc_keys(), vec!["orders", "shop"]);
    }

    #[test]
    fn test_render_shows_label_and_text() {
        let (mut bar, _rx) = bar();
        bar.set_text("{\"tier\": \"gold\"}");
        let mut terminal = Terminal::new(TestBackend::new(40, 3)).unwrap();
        terminal
            .draw(|f| bar.render(f, f.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let top: String = (0..40).map(|x| buffer[(x, 0)].symbol().to_string()).collect();
        let middle: String = (0..40).map(|x| buffer[(x, 1)].symbol().to_string()).collect();
        assert!(top.contains("Query"));
        assert!(middle.contains("\"tier\": \"gold\""));
    }

    #[test]
    fn test_render_keeps_cursor_in_view_for_huge_buffer() {
        let (mut bar, _rx) = bar();
        bar.set_text(&format!("{}end", "x".repeat(70_000)));
        bar.on_event(&Event::FocusChanged(id::QUERY_BAR)).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(40, 3)).unwrap();
        terminal.draw(|f| bar.render(f, f.area())).unwrap();
        let buffer = terminal.backend().buffer();
        let middle: String = (0..40).map(|x| buffer[(x, 1)].symbol().to_string()).collect();
        assert!(middle.contains("xxend"));

        let (visible, offset) = bar.visible_window(38);
        assert_eq!(visible.len(), 37);
        assert_eq!(offset, 37);
    }

    #[test]
    fn test_visible_window_skips_wide_chars_whole() {
        let (mut bar, _rx) = bar();
        bar.set_text("日本語です");
        let (visible, offset) = bar.visible_window(5);
        assert_eq!(visible, "です");
        assert_eq!(offset, 4);

        bar.handle_event(&key(KeyCode::Home));
        assert_eq!(bar.visible_window(5), ("日本語です", 0));
    }
}
