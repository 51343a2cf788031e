//! Footer line with the bindings of whichever component has focus.

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::config::{KeyBindings, Styles};
use crate::core::{
    App, AppError, ComponentId, Event, EventSubscriber, HandlerError, Initializable, id,
};
use crate::tui::component::Component;

#[derive(Default)]
pub struct KeyHints {
    focus: Option<ComponentId>,
    styles: Arc<Styles>,
    keys: Arc<KeyBindings>,
}

impl KeyHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(key, description)` pairs for the focused component, then help.
    pub fn hints(&self) -> Vec<(String, String)> {
        let mut hints: Vec<(String, String)> = self
            .focus
            .as_ref()
            .and_then(|focus| self.keys.keys_for(focus))
            .map(|section| {
                section
                    .keys
                    .iter()
                    .map(|k| (k.label(), k.description.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let help = &self.keys.global.toggle_help;
        hints.push((help.label(), help.description.clone()));
        hints
    }
}

impl Component for KeyHints {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let key = Style::default().fg(self.styles.header.value.color());
        let text = Style::default().fg(self.styles.global.secondary_text.color());
        let spans: Vec<Span> = self
            .hints()
            .into_iter()
            .flat_map(|(k, description)| {
                [
                    Span::styled(format!(" {k} "), key),
                    Span::styled(format!("{description}  "), text),
                ]
            })
            .collect();
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Initializable for KeyHints {
    fn init(&mut self, app: &App) -> Result<(), AppError> {
        self.styles = app.styles();
        self.keys = app.keys();
        self.focus = app.focus().cloned();
        Ok(())
    }
}

impl EventSubscriber for KeyHints {
    fn id(&self) -> ComponentId {
        id::KEY_HINTS
    }

    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError> {
        match event {
            Event::FocusChanged(focus) => self.focus = Some(focus.clone()),
            Event::StyleChanged(styles) => self.styles = Arc::clone(styles),
            Event::KeysChanged(keys) => self.keys = Arc::clone(keys),
            Event::DataChanged(_) => {}
        }
        Ok(())
    }
}
