//! # Document Store
//!
//! The data-access boundary. The UI never talks to storage directly: it
//! spawns a task that calls a [`DocumentStore`] and posts the result back to
//! the UI loop, where failures are shown to whichever component asked.
//!
//! [`MemoryStore`] is the in-process implementation, seeded from a JSON file
//! or a small demo dataset.

pub mod filter;
pub mod memory;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub use filter::Filter;
pub use memory::MemoryStore;

/// A document is a JSON object. `_id` is its primary key.
pub type Document = Map<String, Value>;

/// Database name plus the names of its collections, sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseCollections {
    pub db: String,
    pub collections: Vec<String>,
}

/// A slice of a collection together with the total number of matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounters {
    pub insert: u64,
    pub query: u64,
    pub update: u64,
    pub delete: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerStatus {
    pub name: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub current_connections: u32,
    pub op_counters: OpCounters,
    pub read_only: bool,
    pub is_primary: bool,
}

impl ServerStatus {
    pub fn uptime(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.started_at)
    }
}

/// Errors surfaced by store operations. None are retried automatically.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// No document with this `_id` in the collection.
    NotFound(String),
    /// Insert of a document whose `_id` is already taken.
    DuplicateId(String),
    /// The filter text is not valid JSON or uses an unsupported operator.
    InvalidFilter(String),
    /// A document is not a JSON object or changes its `_id`.
    InvalidDocument(String),
    /// The seed data could not be read or has the wrong shape.
    Seed(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "document not found: {id}"),
            StoreError::DuplicateId(id) => write!(f, "duplicate _id: {id}"),
            StoreError::InvalidFilter(msg) => write!(f, "invalid filter: {msg}"),
            StoreError::InvalidDocument(msg) => write!(f, "invalid document: {msg}"),
            StoreError::Seed(msg) => write!(f, "seed error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every database with its collections, sorted by name.
    async fn list_dbs_with_collections(&self) -> Result<Vec<DatabaseCollections>, StoreError>;

    /// Documents of `db.coll` matching `filter`, skipping `skip` and
    /// returning at most `limit`.
    async fn list_documents(
        &self,
        db: &str,
        coll: &str,
        filter: &Filter,
        skip: u64,
        limit: u64,
    ) -> Result<DocumentPage, StoreError>;

    /// Insert a document, generating `_id` when absent. Returns the `_id`.
    async fn insert_document(
        &self,
        db: &str,
        coll: &str,
        document: Document,
    ) -> Result<Value, StoreError>;

    /// Replace the document whose `_id` is `id`.
    async fn update_document(
        &self,
        db: &str,
        coll: &str,
        id: &Value,
        document: Document,
    ) -> Result<(), StoreError>;

    async fn server_status(&self) -> Result<ServerStatus, StoreError>;

    /// Number of sessions currently open against the store.
    async fn live_sessions(&self) -> Result<u64, StoreError>;
}

/// The `_id` of a document. Ids compare by value and type: `1` and `"1"`
/// are different documents.
pub fn id_of(document: &Document) -> Option<&Value> {
    document.get("_id")
}

/// Whether `document` has the `_id` `id`.
pub fn has_id(document: &Document, id: &Value) -> bool {
    id_of(document) == Some(id)
}

/// An `_id` rendered for display. Strings lose their quotes.
pub fn format_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The `_id` of a document rendered as a plain string, for display only.
pub fn document_id(document: &Document) -> Option<String> {
    id_of(document).map(format_id)
}

/// Top-level keys across `documents`, first-seen order, without duplicates.
pub fn document_keys(documents: &[Document]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in documents.iter().flat_map(|doc| doc.keys()) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.clone());
        }
    }
    keys
}
