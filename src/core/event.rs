//! # Events
//!
//! Notifications fanned out by the [`EventBus`](super::bus::EventBus). The set
//! is closed: a subscriber matches on [`Event`] and the compiler tells it
//! about every kind it might be handed.

use std::sync::Arc;

use crate::config::{KeyBindings, Styles};
use crate::store::{DatabaseCollections, Document, DocumentPage, ServerStatus};

use super::id::ComponentId;

/// A published state transition. Immutable once broadcast; payloads that
/// every subscriber reads are shared through `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Input focus moved to this component. The page stack has settled.
    FocusChanged(ComponentId),
    /// A new style snapshot is active.
    StyleChanged(Arc<Styles>),
    /// A new key-binding snapshot is active.
    KeysChanged(Arc<KeyBindings>),
    /// Something was read from or written to the store.
    DataChanged(DataChange),
}

/// Discriminant of [`Event`], used for logging and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FocusChanged,
    StyleChanged,
    KeysChanged,
    DataChanged,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::FocusChanged(_) => EventKind::FocusChanged,
            Event::StyleChanged(_) => EventKind::StyleChanged,
            Event::KeysChanged(_) => EventKind::KeysChanged,
            Event::DataChanged(_) => EventKind::DataChanged,
        }
    }
}

/// Which collection and which slice of it a document listing covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub db: String,
    pub coll: String,
    /// Filter text as typed in the query bar. Empty matches everything.
    pub filter: String,
    pub skip: u64,
    pub limit: u64,
}

impl Query {
    pub fn is_for(&self, db: &str, coll: &str) -> bool {
        self.db == db && self.coll == coll
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataChange {
    /// The database/collection tree was (re)loaded.
    Databases(Vec<DatabaseCollections>),
    /// A page of documents arrived for `query`. `keys` are the top-level
    /// field names seen on that page.
    Documents {
        query: Query,
        page: DocumentPage,
        keys: Vec<String>,
    },
    /// A single document was re-read from the store.
    Document {
        db: String,
        coll: String,
        document: Document,
    },
    /// A document was written. `created` is true for inserts.
    DocumentSaved {
        db: String,
        coll: String,
        document: Document,
        created: bool,
    },
    ServerStatus {
        status: ServerStatus,
        sessions: u64,
    },
}
