//! # Header Component
//!
//! Top status line: which store we are looking at, how long it has been up,
//! how busy it is, and which collection is open. Server status arrives as
//! `DataChanged(ServerStatus)` on a timer; the open collection is taken from
//! the last page of documents that was broadcast.
//!
//! Failures of the status poll are shown in place of the counters until the
//! next successful poll.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::config::Styles;
use crate::core::{
    App, AppError, ComponentId, DataChange, Event, EventSubscriber, HandlerError, Initializable,
    id,
};
use crate::store::ServerStatus;
use crate::tui::component::{Component, ErrorSink};

use super::panel;

#[derive(Default)]
pub struct Header {
    status: Option<ServerStatus>,
    sessions: u64,
    collection: Option<String>,
    error: Option<String>,
    styles: Arc<Styles>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<&ServerStatus> {
        self.status.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn line(&self, now: DateTime<Utc>) -> Line<'static> {
        let theme = &self.styles.header;
        let key = Style::default().fg(theme.key.color());
        let value = Style::default().fg(theme.value.color());
        let active = Style::default().fg(theme.active.color());

        let mut spans = Vec::new();
        match &self.status {
            Some(status) => {
                spans.push(Span::styled(status.name.clone(), active));
                spans.push(Span::styled(format!(" v{}", status.version), value));
                spans.push(Span::styled("  uptime ", key));
                spans.push(Span::styled(format_uptime(status.uptime(now)), value));
                spans.push(Span::styled("  conns ", key));
                spans.push(Span::styled(status.current_connections.to_string(), value));
                spans.push(Span::styled("  sessions ", key));
                spans.push(Span::styled(self.sessions.to_string(), value));
                let role = if status.is_primary { "primary" } else { "secondary" };
                spans.push(Span::styled(format!("  {role}"), key));
                if status.read_only {
                    spans.push(Span::styled(" (read-only)", key));
                }
            }
            None => spans.push(Span::styled("connecting...", key)),
        }
        if let Some(collection) = &self.collection {
            spans.push(Span::styled("  in ", key));
            spans.push(Span::styled(collection.clone(), active));
        }
        if let Some(error) = &self.error {
            spans.push(Span::styled(
                format!("  {error}"),
                Style::default().fg(self.styles.global.error.color()),
            ));
        }
        Line::from(spans)
    }
}

/// `3d 4h`, `4h 12m`, `12m 5s`.
fn format_uptime(uptime: chrono::Duration) -> String {
    let secs = uptime.num_seconds().max(0);
    let (days, hours, mins) = (secs / 86_400, (secs / 3600) % 24, (secs / 60) % 60);
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m {}s", secs % 60)
    }
}

impl Component for Header {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = panel(" mongui ", false, &self.styles);
        frame.render_widget(Paragraph::new(self.line(Utc::now())).block(block), area);
    }
}

impl ErrorSink for Header {
    fn show_error(&mut self, message: String) {
        self.error = Some(message);
    }
}

impl Initializable for Header {
    fn init(&mut self, app: &App) -> Result<(), AppError> {
        self.styles = app.styles();
        Ok(())
    }
}

impl EventSubscriber for Header {
    fn id(&self) -> ComponentId {
        id::HEADER
    }

    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError> {
        match event {
            Event::StyleChanged(styles) => self.styles = Arc::clone(styles),
            Event::DataChanged(DataChange::ServerStatus { status, sessions }) => {
                self.status = Some(status.clone());
                self.sessions = *sessions;
                self.error = None;
            }
            Event::DataChanged(DataChange::Documents { query, .. }) => {
                self.collection = Some(format!("{}.{}", query.db, query.coll));
            }
            _ => {}
        }
        Ok(())
    }
}
