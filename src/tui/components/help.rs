//! # Help Component
//!
//! Overlay listing every key binding, grouped by the component it belongs
//! to. Rebuilt from the current bindings each time it is drawn, so reloaded
//! keys show up immediately.

use std::sync::Arc;

use crossterm::event::KeyCode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph};

use crate::config::{KeyBindings, Styles};
use crate::core::{
    App, AppError, ComponentId, Event, EventSubscriber, HandlerError, Initializable, id,
};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

use super::{centered_rect, overlay_block};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpEvent {
    Close,
}

#[derive(Default)]
pub struct Help {
    scroll: u16,
    styles: Arc<Styles>,
    keys: Arc<KeyBindings>,
}

impl Help {
    pub fn new() -> Self {
        Self::default()
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let title = Style::default()
            .fg(self.styles.overlay.title.color())
            .add_modifier(Modifier::BOLD);
        let key = Style::default().fg(self.styles.header.value.color());
        let text = Style::default().fg(self.styles.overlay.text.color());

        let mut lines = Vec::new();
        for section in self.keys.all_keys() {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(Line::from(Span::styled(section.element, title)));
            for binding in section.keys {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {:<18}", binding.label()), key),
                    Span::styled(binding.description.clone(), text),
                ]));
            }
        }
        lines
    }
}

impl Component for Help {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(70, 80, area);
        frame.render_widget(Clear, overlay);

        let lines = self.lines();
        let visible = overlay.height.saturating_sub(2);
        self.scroll = self
            .scroll
            .min((lines.len() as u16).saturating_sub(visible));

        let block = overlay_block(" Key Bindings ", &self.styles);
        frame.render_widget(
            Paragraph::new(lines).block(block).scroll((self.scroll, 0)),
            overlay,
        );
    }
}

impl EventHandler for Help {
    type Event = HelpEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<HelpEvent> {
        let TuiEvent::Key(key) = event else {
            return None;
        };
        if self.keys.help.close.matches(key) {
            return Some(HelpEvent::Close);
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            _ => {}
        }
        None
    }
}

impl Initializable for Help {
    fn init(&mut self, app: &App) -> Result<(), AppError> {
        self.styles = app.styles();
        self.keys = app.keys();
        Ok(())
    }
}

impl EventSubscriber for Help {
    fn id(&self) -> ComponentId {
        id::HELP
    }

    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError> {
        match event {
            Event::StyleChanged(styles) => self.styles = Arc::clone(styles),
            Event::KeysChanged(keys) => self.keys = Arc::clone(keys),
            Event::FocusChanged(focus) if *focus == id::HELP => self.scroll = 0,
            _ => {}
        }
        Ok(())
    }
}
