use ratatui::Frame;
use ratatui::layout::Rect;

use super::event::TuiEvent;

/// A reusable UI component.
///
/// Components hold their own presentation state and the style/key snapshots
/// they were last given. They render to a `Frame` within a given `Rect`.
///
/// # Mutability
///
/// The `render` method takes `&mut self` so components can keep scroll
/// offsets and list state in step with what was actually drawn.
pub trait Component {
    /// Render the component into the given area.
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that handles terminal events.
///
/// Handlers never reach for the orchestrator. They return a high-level event
/// and the dispatcher acts on it once the component's borrow has ended.
pub trait EventHandler {
    /// The type of high-level event this component emits.
    type Event;

    /// Handle a low-level `TuiEvent` and optionally return a high-level event.
    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}

/// A component that can display a failure of something it asked for.
pub trait ErrorSink {
    fn show_error(&mut self, message: String);
}
