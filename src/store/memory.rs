//! In-process document store.
//!
//! Data is held as `database → collection → documents` behind a tokio
//! `RwLock`. Seed files use the same nesting:
//!
//! ```json
//! { "shop": { "customers": [ { "_id": "c1", "name": "Ada" } ] } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde_json::{Value, json};
use tokio::sync::RwLock;

use super::{
    DatabaseCollections, Document, DocumentPage, DocumentStore, Filter, OpCounters, ServerStatus,
    StoreError, format_id, has_id, id_of,
};

type Collections = BTreeMap<String, Vec<Document>>;

#[derive(Default)]
struct State {
    databases: BTreeMap<String, Collections>,
    counters: OpCounters,
}

pub struct MemoryStore {
    name: String,
    started_at: DateTime<Utc>,
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: Utc::now(),
            state: RwLock::new(State::default()),
        }
    }

    /// Build a store from a `{ db: { coll: [docs] } }` value.
    pub fn from_seed(name: impl Into<String>, seed: Value) -> Result<Self, StoreError> {
        let Value::Object(dbs) = seed else {
            return Err(StoreError::Seed("top level must be an object of databases".to_string()));
        };

        let mut databases = BTreeMap::new();
        for (db, colls) in dbs {
            let Value::Object(colls) = colls else {
                return Err(StoreError::Seed(format!("database '{db}' must be an object")));
            };
            let mut collections = Collections::new();
            for (coll, docs) in colls {
                let Value::Array(docs) = docs else {
                    return Err(StoreError::Seed(format!("'{db}.{coll}' must be an array")));
                };
                let docs = docs
                    .into_iter()
                    .map(|doc| into_document(doc).map(with_id))
                    .collect::<Result<Vec<_>, _>>()?;
                collections.insert(coll, docs);
            }
            databases.insert(db, collections);
        }

        Ok(Self {
            name: name.into(),
            started_at: Utc::now(),
            state: RwLock::new(State {
                databases,
                counters: OpCounters::default(),
            }),
        })
    }

    /// Read a seed file from disk.
    pub fn load_seed(name: impl Into<String>, path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;
        let seed: Value = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;
        info!("Seeding store from {}", path.display());
        Self::from_seed(name, seed)
    }

    /// A small dataset so the UI has something to browse out of the box.
    pub fn demo(name: impl Into<String>) -> Self {
        let name = name.into();
        let seed = json!({
            "shop": {
                "customers": [
                    { "_id": "c1", "name": "Ada Lovelace", "email": "ada@example.com", "tier": "gold",
                      "address": { "city": "London", "zip": "EC1" } },
                    { "_id": "c2", "name": "Grace Hopper", "email": "grace@example.com", "tier": "silver",
                      "address": { "city": "New York", "zip": "10001" } },
                    { "_id": "c3", "name": "Alan Turing", "email": "alan@example.com", "tier": "gold",
                      "address": { "city": "Manchester", "zip": "M1" } }
                ],
                "orders": [
                    { "_id": "o1", "customer": "c1", "total": 120.5, "items": ["keyboard", "mouse"] },
                    { "_id": "o2", "customer": "c2", "total": 42, "items": ["cable"] },
                    { "_id": "o3", "customer": "c1", "total": 999.99, "items": ["laptop"] }
                ]
            },
            "blog": {
                "posts": [
                    { "_id": "p1", "title": "Hello", "tags": ["intro"], "published": true },
                    { "_id": "p2", "title": "Ownership", "tags": ["rust", "memory"], "published": true },
                    { "_id": "p3", "title": "Drafts", "tags": [], "published": false }
                ],
                "comments": []
            }
        });
        // The literal above is always a valid seed.
        Self::from_seed(name.clone(), seed).unwrap_or_else(|_| Self::new(name))
    }
}

fn into_document(value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!("expected an object, got {other}"))),
    }
}

fn with_id(mut document: Document) -> Document {
    if !document.contains_key("_id") {
        document.insert("_id".to_string(), Value::String(new_object_id()));
    }
    document
}

fn new_object_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_dbs_with_collections(&self) -> Result<Vec<DatabaseCollections>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .databases
            .iter()
            .map(|(db, colls)| DatabaseCollections {
                db: db.clone(),
                collections: colls.keys().cloned().collect(),
            })
            .collect())
    }

    async fn list_documents(
        &self,
        db: &str,
        coll: &str,
        filter: &Filter,
        skip: u64,
        limit: u64,
    ) -> Result<DocumentPage, StoreError> {
        let mut state = self.state.write().await;
        state.counters.query += 1;

        // Like a real server, an absent collection is simply empty.
        let Some(docs) = state.databases.get(db).and_then(|c| c.get(coll)) else {
            return Ok(DocumentPage {
                documents: Vec::new(),
                total: 0,
            });
        };

        let matching: Vec<&Document> = docs.iter().filter(|d| filter.matches(d)).collect();
        let total = matching.len() as u64;
        let documents = matching
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        debug!("Query {}.{} skip={} limit={} total={}", db, coll, skip, limit, total);
        Ok(DocumentPage { documents, total })
    }

    async fn insert_document(
        &self,
        db: &str,
        coll: &str,
        document: Document,
    ) -> Result<Value, StoreError> {
        let document = with_id(document);
        let id = id_of(&document).cloned().unwrap_or(Value::Null);

        let mut state = self.state.write().await;
        let docs = state
            .databases
            .entry(db.to_string())
            .or_default()
            .entry(coll.to_string())
            .or_default();
        if docs.iter().any(|d| has_id(d, &id)) {
            return Err(StoreError::DuplicateId(format_id(&id)));
        }
        docs.push(document);
        state.counters.insert += 1;
        info!("Inserted {} into {}.{}", id, db, coll);
        Ok(id)
    }

    async fn update_document(
        &self,
        db: &str,
        coll: &str,
        id: &Value,
        mut document: Document,
    ) -> Result<(), StoreError> {
        match id_of(&document) {
            Some(new_id) if new_id != id => {
                return Err(StoreError::InvalidDocument(format!(
                    "_id cannot change ({id} → {new_id})"
                )));
            }
            Some(_) => {}
            None => {
                document.insert("_id".to_string(), id.clone());
            }
        }

        let mut state = self.state.write().await;
        let slot = state
            .databases
            .get_mut(db)
            .and_then(|c| c.get_mut(coll))
            .and_then(|docs| docs.iter_mut().find(|d| has_id(d, id)))
            .ok_or_else(|| StoreError::NotFound(format_id(id)))?;
        *slot = document;
        state.counters.update += 1;
        info!("Updated {} in {}.{}", id, db, coll);
        Ok(())
    }

    async fn server_status(&self) -> Result<ServerStatus, StoreError> {
        let state = self.state.read().await;
        Ok(ServerStatus {
            name: self.name.clone(),
            version: format!("mongui-memory {}", env!("CARGO_PKG_VERSION")),
            started_at: self.started_at,
            current_connections: 1,
            op_counters: state.counters,
            read_only: false,
            is_primary: true,
        })
    }

    async fn live_sessions(&self) -> Result<u64, StoreError> {
        // The UI is the only client of an in-process store.
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::document_id;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_demo_lists_sorted_databases() {
        let store = MemoryStore::demo("test");
        let dbs = store.list_dbs_with_collections().await.unwrap();
        let names: Vec<&str> = dbs.iter().map(|d| d.db.as_str()).collect();
        assert_eq!(names, vec!["blog", "shop"]);
        assert_eq!(dbs[1].collections, vec!["customers", "orders"]);
    }

    #[tokio::test]
    async fn test_pagination_reports_filtered_total() {
        let store = MemoryStore::demo("test");
        let filter = Filter::parse(r#"{"tier": "gold"}"#).unwrap();
        let page = store
            .list_documents("shop", "customers", &filter, 1, 10)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.documents.len(), 1);
        assert_eq!(document_id(&page.documents[0]).as_deref(), Some("c3"));
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty() {
        let store = MemoryStore::demo("test");
        let page = store
            .list_documents("nope", "nothing", &Filter::Everything, 0, 10)
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_insert_generates_id_and_rejects_duplicates() {
        let store = MemoryStore::new("test");
        let id = store
            .insert_document("db", "coll", doc(json!({"a": 1})))
            .await
            .unwrap();
        assert_eq!(id.as_str().map(str::len), Some(32));

        let dup = store
            .insert_document("db", "coll", doc(json!({"_id": id.clone()})))
            .await;
        assert_eq!(dup, Err(StoreError::DuplicateId(format_id(&id))));

        let status = store.server_status().await.unwrap();
        assert_eq!(status.op_counters.insert, 1);
    }

    #[tokio::test]
    async fn test_numeric_and_string_ids_are_distinct() {
        let store = MemoryStore::new("test");
        store
            .insert_document("d", "c", doc(json!({"_id": 1, "kind": "number"})))
            .await
            .unwrap();
        let id = store
            .insert_document("d", "c", doc(json!({"_id": "1", "kind": "string"})))
            .await
            .unwrap();
        assert_eq!(id, json!("1"));

        store
            .update_document("d", "c", &json!("1"), doc(json!({"kind": "edited"})))
            .await
            .unwrap();
        let page = store
            .list_documents("d", "c", &Filter::Everything, 0, 10)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.documents[0]["kind"], "number");
        assert_eq!(page.documents[1]["kind"], "edited");
        assert_eq!(page.documents[1]["_id"], "1");

        let missing = store
            .update_document("d", "c", &json!(2), doc(json!({})))
            .await;
        assert_eq!(missing, Err(StoreError::NotFound("2".to_string())));
    }

    #[tokio::test]
    async fn test_update_replaces_by_id() {
        let store = MemoryStore::demo("test");
        store
            .update_document("blog", "posts", &json!("p3"), doc(json!({"title": "Published"})))
            .await
            .unwrap();
        let filter = Filter::parse(r#"{"_id": "p3"}"#).unwrap();
        let page = store.list_documents("blog", "posts", &filter, 0, 1).await.unwrap();
        assert_eq!(page.documents[0].get("title"), Some(&json!("Published")));
        assert_eq!(page.documents[0].get("published"), None);
    }

    #[tokio::test]
    async fn test_update_rejects_id_change_and_unknown_id() {
        let store = MemoryStore::demo("test");
        let changed = store
            .update_document("blog", "posts", &json!("p1"), doc(json!({"_id": "other"})))
            .await;
        assert!(matches!(changed, Err(StoreError::InvalidDocument(_))));

        let missing = store
            .update_document("blog", "posts", &json!("zzz"), doc(json!({})))
            .await;
        assert_eq!(missing, Err(StoreError::NotFound("zzz".to_string())));
    }

    #[test]
    fn test_seed_shape_is_validated() {
        assert!(matches!(
            MemoryStore::from_seed("t", json!([1, 2])),
            Err(StoreError::Seed(_))
        ));
        assert!(matches!(
            MemoryStore::from_seed("t", json!({"db": {"coll": {}}})),
            Err(StoreError::Seed(_))
        ));
        assert!(matches!(
            MemoryStore::from_seed("t", json!({"db": {"coll": [1]}})),
            Err(StoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_load_seed_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, r#"{"db": {"coll": [{"x": 1}]}}"#).unwrap();
        let store = MemoryStore::load_seed("t", &path).unwrap();
        let dbs = tokio_test::block_on(store.list_dbs_with_collections()).unwrap();
        assert_eq!(dbs[0].collections, vec!["coll"]);
    }
}
