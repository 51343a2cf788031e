//! # TUI Components
//!
//! Every interactive piece of the screen lives here. Each one is owned by the
//! UI loop as an `Rc<RefCell<_>>`, registered with the [`App`] once at
//! startup, and from then on learns about the world only through the events
//! the bus delivers to it.
//!
//! ## Component Architecture
//!
//! A component file holds everything about that component:
//! - its state
//! - the high-level events its key handler emits
//! - rendering
//! - its reaction to bus events
//! - tests
//!
//! Key handlers never call back into the orchestrator. They return an event
//! such as [`ContentEvent::Peek`] and the dispatcher (see `tui::dispatch`)
//! turns it into page, focus or store calls after the component's borrow
//! has ended.
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs            (this file, shared helpers)
//! ├── header.rs         (server status line)
//! ├── databases.rs      (database/collection tree)
//! ├── content.rs        (paged document list)
//! ├── doc_peeker.rs     (single document overlay)
//! ├── history_modal.rs  (query history overlay)
//! ├── help.rs           (key binding overlay)
//! ├── style_picker.rs   (style switcher overlay)
//! ├── key_hints.rs      (footer hints for the focused component)
//! └── input_bar/        (query and filter bars)
//! ```
//!
//! [`App`]: crate::core::App

pub mod content;
pub mod databases;
pub mod doc_peeker;
pub mod header;
pub mod help;
pub mod history_modal;
pub mod input_bar;
pub mod key_hints;
pub mod style_picker;

pub use content::{Content, ContentEvent};
pub use databases::{Databases, DatabasesEvent};
pub use doc_peeker::{DocPeeker, PeekerEvent};
pub use header::Header;
pub use help::{Help, HelpEvent};
pub use history_modal::{HistoryEvent, HistoryModal};
pub use input_bar::{InputBar, InputBarEvent};
pub use key_hints::KeyHints;
pub use style_picker::{StylePicker, StylePickerEvent};

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Block;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Styles;

/// Truncate a string to fit within `max_width` columns, adding "..." if needed.
pub fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width - 3 {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Compute a centered rect using percentage of the outer rect.
pub fn centered_rect(percent_x: u16, percent_y: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}

/// A bordered panel whose border lights up while `focused`.
pub fn panel<'a>(title: &'a str, focused: bool, styles: &Styles) -> Block<'a> {
    let border = if focused {
        styles.global.focus.color()
    } else {
        styles.global.border.color()
    };
    Block::bordered()
        .border_style(Style::default().fg(border))
        .title(title)
        .title_style(Style::default().fg(styles.global.title.color()))
}

/// The border of an overlay drawn over everything else.
pub fn overlay_block<'a>(title: &'a str, styles: &Styles) -> Block<'a> {
    Block::bordered()
        .border_style(Style::default().fg(styles.overlay.border.color()))
        .title(title)
        .title_style(Style::default().fg(styles.overlay.title.color()))
}
