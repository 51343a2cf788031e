//! The capability set every interactive component implements.

use std::fmt;

use super::app::{App, AppError};
use super::event::Event;
use super::id::ComponentId;

/// One-time wiring to the orchestrator.
///
/// Called by [`App::register`], which guarantees a single call per
/// component. Components read their style, key and config snapshots here;
/// later changes arrive as events.
pub trait Initializable {
    fn init(&mut self, app: &App) -> Result<(), AppError>;
}

/// A component that listens on the event bus.
pub trait EventSubscriber {
    /// The component's process-unique name.
    fn id(&self) -> ComponentId;

    /// React to a broadcast event. Must not block.
    fn on_event(&mut self, event: &Event) -> Result<(), HandlerError>;
}

/// A handler rejected an event. Logged by the bus, never propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for HandlerError {}
