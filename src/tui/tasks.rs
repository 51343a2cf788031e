//! Background store calls.
//!
//! Each function spawns one tokio task that talks to the store and posts a
//! single [`UiMessage`] back to the UI loop: `Data` on success, `Failed`
//! naming the component that should show the error otherwise.

use std::sync::{Arc, mpsc};
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use crate::core::{ComponentId, DataChange, Query, id};
use crate::store::{Document, DocumentStore, Filter, StoreError, document_keys, id_of};
use crate::tui::message::UiMessage;

fn post(
    tx: &mpsc::Sender<UiMessage>,
    requester: ComponentId,
    result: Result<DataChange, StoreError>,
) {
    let message = match result {
        Ok(change) => UiMessage::Data(change),
        Err(error) => {
            warn!("Store call for {} failed: {}", requester, error);
            UiMessage::Failed { requester, error }
        }
    };
    if tx.send(message).is_err() {
        warn!("Failed to post store result: receiver dropped");
    }
}

pub fn spawn_load_databases(store: Arc<dyn DocumentStore>, tx: mpsc::Sender<UiMessage>) {
    tokio::spawn(async move {
        let result = store
            .list_dbs_with_collections()
            .await
            .map(DataChange::Databases);
        post(&tx, id::DATABASES, result);
    });
}

pub fn spawn_load_documents(
    store: Arc<dyn DocumentStore>,
    query: Query,
    tx: mpsc::Sender<UiMessage>,
) {
    debug!("Loading {}.{} skip={} filter={:?}", query.db, query.coll, query.skip, query.filter);
    tokio::spawn(async move {
        let result = load_documents(store.as_ref(), query).await;
        post(&tx, id::CONTENT, result);
    });
}

async fn load_documents(store: &dyn DocumentStore, query: Query) -> Result<DataChange, StoreError> {
    let filter = Filter::parse(&query.filter)?;
    let page = store
        .list_documents(&query.db, &query.coll, &filter, query.skip, query.limit)
        .await?;
    let keys = document_keys(&page.documents);
    Ok(DataChange::Documents { query, page, keys })
}

/// Re-read the document whose `_id` is `id_value`.
pub fn spawn_load_document(
    store: Arc<dyn DocumentStore>,
    db: String,
    coll: String,
    id_value: Value,
    tx: mpsc::Sender<UiMessage>,
) {
    tokio::spawn(async move {
        let result = load_document(store.as_ref(), db, coll, id_value).await;
        post(&tx, id::DOC_PEEKER, result);
    });
}

async fn load_document(
    store: &dyn DocumentStore,
    db: String,
    coll: String,
    id_value: Value,
) -> Result<DataChange, StoreError> {
    let filter = Filter::from_value(&json!({ "_id": id_value.clone() }))?;
    let page = store.list_documents(&db, &coll, &filter, 0, 1).await?;
    let document = page
        .documents
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::NotFound(id_value.to_string()))?;
    Ok(DataChange::Document { db, coll, document })
}

/// Insert `document`, or replace `original` with it when editing.
pub fn spawn_save_document(
    store: Arc<dyn DocumentStore>,
    db: String,
    coll: String,
    original: Option<Document>,
    document: Document,
    tx: mpsc::Sender<UiMessage>,
) {
    tokio::spawn(async move {
        let result = save_document(store.as_ref(), db, coll, original, document).await;
        post(&tx, id::CONTENT, result);
    });
}

async fn save_document(
    store: &dyn DocumentStore,
    db: String,
    coll: String,
    original: Option<Document>,
    mut document: Document,
) -> Result<DataChange, StoreError> {
    let original_id = original.as_ref().and_then(id_of).cloned();
    let created = match original_id {
        Some(id) => {
            store.update_document(&db, &coll, &id, document.clone()).await?;
            document.entry("_id".to_string()).or_insert(id);
            false
        }
        None => {
            let id = store.insert_document(&db, &coll, document.clone()).await?;
            document.entry("_id".to_string()).or_insert(id);
            true
        }
    };
    info!("Saved document in {}.{} (created={})", db, coll, created);
    Ok(DataChange::DocumentSaved {
        db,
        coll,
        document,
        created,
    })
}

/// Poll server status and session count every `interval` until the UI loop
/// goes away.
pub fn spawn_status_poll(
    store: Arc<dyn DocumentStore>,
    tx: mpsc::Sender<UiMessage>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let result = async {
                let status = store.server_status().await?;
                let sessions = store.live_sessions().await?;
                Ok::<_, StoreError>(DataChange::ServerStatus { status, sessions })
            }
            .await;
            let message = match result {
                Ok(change) => UiMessage::Data(change),
                Err(error) => UiMessage::Failed {
                    requester: id::HEADER,
                    error,
                },
            };
            if tx.send(message).is_err() {
                debug!("UI loop gone, stopping status poll");
                return;
            }
        }
    })
}
