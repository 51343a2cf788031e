//! Screen layout.
//!
//! ```text
//! ┌ header ─────────────────────────────────────────┐
//! ├ filter bar? ─────┬ query bar? ───────────────────┤
//! │ databases        │ content                       │
//! │                  │                               │
//! └──────────────────┴───────────────────────────────┘
//!  key hints
//! ```
//!
//! Input bars are docked pages: they take space above their list only while
//! shown. Overlay pages are drawn last, over everything, in stack order.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Block;

use crate::core::{ComponentId, id};
use crate::tui::component::Component;
use crate::tui::dispatch::Screen;

/// Height of a docked input bar.
const BAR_HEIGHT: u16 = 3;

pub fn draw_ui(frame: &mut Frame, screen: &Screen) {
    use Constraint::{Length, Min, Percentage};

    let background = screen.app.styles().global.background.color();
    frame.render_widget(Block::default().style(Style::default().bg(background)), frame.area());

    let [header_area, body_area, hints_area] =
        Layout::vertical([Length(3), Min(0), Length(1)]).areas(frame.area());
    let [left, right] = Layout::horizontal([Percentage(30), Percentage(70)]).areas(body_area);

    screen.header.borrow_mut().render(frame, header_area);

    let (filter_area, tree_area) = split_for_bar(screen, &id::FILTER_BAR, left);
    if let Some(area) = filter_area {
        screen.filter_bar.borrow_mut().render(frame, area);
    }
    screen.databases.borrow_mut().render(frame, tree_area);

    let (query_area, list_area) = split_for_bar(screen, &id::QUERY_BAR, right);
    if let Some(area) = query_area {
        screen.query_bar.borrow_mut().render(frame, area);
    }
    screen.content.borrow_mut().render(frame, list_area);

    screen.key_hints.borrow_mut().render(frame, hints_area);

    let full = frame.area();
    for page in screen.app.pages().pages() {
        if !page.visible || !page.resize {
            continue;
        }
        match page.id.as_str() {
            "History" => screen.history.borrow_mut().render(frame, full),
            "DocPeeker" => screen.peeker.borrow_mut().render(frame, full),
            "Help" => screen.help.borrow_mut().render(frame, full),
            "StylePicker" => screen.style_picker.borrow_mut().render(frame, full),
            other => log::debug!("No overlay renderer for {}", other),
        }
    }
}

/// Carve a docked bar off the top of `area` while `bar` is shown.
fn split_for_bar(screen: &Screen, bar: &ComponentId, area: Rect) -> (Option<Rect>, Rect) {
    let shown = screen
        .app
        .pages()
        .page(bar)
        .is_some_and(|page| page.visible);
    if !shown || area.height <= BAR_HEIGHT {
        return (None, area);
    }
    let [bar_area, rest] =
        Layout::vertical([Constraint::Length(BAR_HEIGHT), Constraint::Min(0)]).areas(area);
    (Some(bar_area), rest)
}
