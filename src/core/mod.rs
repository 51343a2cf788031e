//! # Component Orchestration
//!
//! Decides which component owns the screen and who hears about which state
//! transition. Knows nothing about drawing.
//!
//! ```text
//!                  ┌──────────────────────────────┐
//!                  │             App              │
//!                  │  focus · styles · key binds  │
//!                  └──────┬───────────────┬───────┘
//!                         │               │
//!                  ┌──────▼──────┐ ┌──────▼──────┐
//!                  │  PageStack  │ │  EventBus   │
//!                  │ pages+focus │ │ subscribers │
//!                  └─────────────┘ └──────┬──────┘
//!                                         │ broadcast(Event)
//!                     ┌─────────┬─────────┼─────────┬─────────┐
//!                     ▼         ▼         ▼         ▼         ▼
//!                  Header  Databases  Content  DocPeeker     ...
//! ```
//!
//! ## Modules
//!
//! - [`app`]: the orchestrator, the only place focus changes
//! - [`pages`]: page and focus-restoration bookkeeping
//! - [`bus`]: subscriber registry and fan-out
//! - [`event`]: the closed set of events
//! - [`component`]: traits every component implements
//! - [`guard`]: panic boundaries for handlers and input steps
//! - [`id`]: component identities

pub mod app;
pub mod bus;
pub mod component;
pub mod event;
pub mod guard;
pub mod id;
pub mod pages;

pub use app::{App, AppError};
pub use bus::{Delivery, EventBus};
pub use component::{EventSubscriber, HandlerError, Initializable};
pub use event::{DataChange, Event, EventKind, Query};
pub use id::ComponentId;
pub use pages::{FocusMove, Page, PageRequest, PageStack};
