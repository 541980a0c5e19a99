//! In-memory storage implementation for document stores.
//!
//! Documents are kept as BSON documents in ordered maps keyed by identifier,
//! behind an async-safe read-write lock.

use std::{collections::{BTreeMap, HashMap}, sync::Arc, cmp::Ordering};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Document, oid::ObjectId};
use tracing::debug;

use docrepo_core::{
    backend::{Connect, ReplaceOutcome, StoreBackend, StoreBackendBuilder, stamp_id},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, Query, SortDirection},
    settings::ConnectionSettings,
};

use crate::evaluator::{Comparable, DocumentEvaluator, lookup};

type CollectionMap = BTreeMap<ObjectId, Document>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// Behaves like a document store as far as repositories can observe:
/// duplicate inserts fail, replaces report matched and modified counts, and
/// upserts create missing documents. Collections spring into existence on
/// first write and read as empty before that.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state.
/// Clones share the same underlying data.
///
/// # Ordering
///
/// Unsorted reads return documents in identifier order. Identifiers
/// generated by one process increase over time, so this approximates
/// insertion order. Sorted reads place missing fields with nulls and order
/// mixed types by type bracket, as a MongoDB server does.
///
/// Scalar filters on array fields match when any element matches.
///
/// # Example
///
/// ```ignore
/// use docrepo_memory::InMemoryStore;
/// use docrepo::backend::StoreBackend;
/// use bson::{doc, oid::ObjectId};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     store.insert_document("User", ObjectId::new(), doc! { "name": "Alice" }).await?;
///     assert_eq!(store.count_documents("User", None).await?, 1);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> (document_id -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn compare(left: &Document, right: &Document, field: &str) -> Ordering {
        let left = lookup(left, field)
            .map(Comparable::from)
            .unwrap_or(Comparable::Null);
        let right = lookup(right, field)
            .map(Comparable::from)
            .unwrap_or(Comparable::Null);

        left.total_cmp(&right)
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, collection: &str, id: ObjectId, document: Document) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        if collection_map.contains_key(&id) {
            return Err(DocumentStoreError::DocumentAlreadyExists(id.to_hex(), collection.to_string()));
        }

        collection_map.insert(id, stamp_id(id, document));

        Ok(())
    }

    async fn replace_document(
        &self,
        collection: &str,
        id: ObjectId,
        document: Document,
        upsert: bool,
    ) -> DocumentStoreResult<ReplaceOutcome> {
        let mut store = self.store.write().await;
        let document = stamp_id(id, document);

        let existing = store
            .get_mut(collection)
            .and_then(|collection_map| collection_map.get_mut(&id));

        if let Some(existing) = existing {
            let modified = *existing != document;

            if modified {
                *existing = document;
            }

            return Ok(ReplaceOutcome {
                matched: 1,
                modified: modified as u64,
                upserted_id: None,
            });
        }

        if !upsert {
            return Ok(ReplaceOutcome::default());
        }

        store
            .entry(collection.to_string())
            .or_default()
            .insert(id, document);

        debug!(collection, %id, "upserted document");

        Ok(ReplaceOutcome {
            matched: 0,
            modified: 0,
            upserted_id: Some(id),
        })
    }

    async fn delete_document(&self, collection: &str, id: ObjectId) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;

        Ok(
            store
                .get_mut(collection)
                .and_then(|collection_map| collection_map.remove(&id))
                .map_or(0, |_| 1)
        )
    }

    async fn count_documents(&self, collection: &str, filter: Option<Expr>) -> DocumentStoreResult<u64> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(0);
        };

        let count = match &filter {
            Some(filter) => DocumentEvaluator::filter_documents(collection_map.values(), filter)?.len(),
            None => collection_map.len(),
        };

        Ok(count as u64)
    }

    async fn find_documents(&self, collection: &str, query: Query) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        // Apply filter expressions if present
        let mut documents = match &query.filter {
            Some(filter) => DocumentEvaluator::filter_documents(collection_map.values(), filter)?,
            None => collection_map.values().collect::<Vec<_>>(),
        };

        if let Some(sort) = &query.sort {
            documents.sort_by(|a, b| match sort.direction {
                SortDirection::Asc => Self::compare(a, b, &sort.field),
                SortDirection::Desc => Self::compare(b, a, &sort.field),
            });
        }

        Ok(
            documents
                .into_iter()
                .skip(query.offset.unwrap_or(0))
                .take(match query.limit {
                    Some(0) | None => usize::MAX,
                    Some(limit) => limit,
                })
                .cloned()
                .collect()
        )
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names = self.store
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();

        names.sort();

        Ok(names)
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store.write().await.remove(name);

        Ok(())
    }
}

#[async_trait]
impl Connect for InMemoryStore {
    /// Every connection opens a fresh, empty store; the settings are not consulted.
    async fn connect(_settings: &ConnectionSettings) -> DocumentStoreResult<Self> {
        InMemoryStore::builder().build().await
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docrepo_memory::InMemoryStore;
/// use docrepo::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await.unwrap();
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, doc};
    use docrepo_core::query::Filter;

    const USERS: &str = "User";

    async fn seeded() -> (InMemoryStore, Vec<ObjectId>) {
        let store = InMemoryStore::new();
        let mut ids = Vec::new();

        for (name, age) in [("Ada", 36), ("Grace", 85), ("Linus", 28)] {
            let id = ObjectId::new();
            store.insert_document(USERS, id, doc! { "name": name, "age": age }).await.unwrap();
            ids.push(id);
        }

        (store, ids)
    }

    #[tokio::test]
    async fn insert_stamps_id_and_rejects_duplicates() {
        let store = InMemoryStore::new();
        let id = ObjectId::new();

        store.insert_document(USERS, id, doc! { "name": "Ada" }).await.unwrap();
        let err = store.insert_document(USERS, id, doc! { "name": "Ada" }).await.unwrap_err();

        assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(_, ref c) if c == USERS));

        let documents = store.find_documents(USERS, Query::by_id(id)).await.unwrap();
        assert_eq!(documents, vec![doc! { "_id": id, "name": "Ada" }]);
    }

    #[tokio::test]
    async fn replace_reports_matched_and_modified() {
        let (store, ids) = seeded().await;

        let changed = store
            .replace_document(USERS, ids[0], doc! { "name": "Ada", "age": 37 }, true)
            .await
            .unwrap();
        assert_eq!(changed, ReplaceOutcome { matched: 1, modified: 1, upserted_id: None });

        let same = store
            .replace_document(USERS, ids[0], doc! { "name": "Ada", "age": 37 }, true)
            .await
            .unwrap();
        assert_eq!(same, ReplaceOutcome { matched: 1, modified: 0, upserted_id: None });
    }

    #[tokio::test]
    async fn replace_upserts_only_when_asked() {
        let store = InMemoryStore::new();
        let id = ObjectId::new();

        let skipped = store.replace_document(USERS, id, doc! { "name": "x" }, false).await.unwrap();
        assert_eq!(skipped, ReplaceOutcome::default());
        assert_eq!(store.count_documents(USERS, None).await.unwrap(), 0);

        let created = store.replace_document(USERS, id, doc! { "name": "x" }, true).await.unwrap();
        assert_eq!(created.upserted_id, Some(id));
        assert_eq!(store.count_documents(USERS, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_removes_only_the_matching_document() {
        let (store, ids) = seeded().await;

        assert_eq!(store.delete_document(USERS, ids[1]).await.unwrap(), 1);
        assert_eq!(store.delete_document(USERS, ids[1]).await.unwrap(), 0);
        assert_eq!(store.delete_document("Missing", ids[0]).await.unwrap(), 0);

        let remaining = store.find_documents(USERS, Query::new()).await.unwrap();
        let remaining_ids = remaining
            .iter()
            .map(|document| document.get_object_id("_id").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(remaining_ids, vec![ids[0], ids[2]]);
    }

    #[tokio::test]
    async fn count_with_and_without_filter() {
        let (store, _) = seeded().await;

        assert_eq!(store.count_documents(USERS, None).await.unwrap(), 3);
        assert_eq!(store.count_documents(USERS, Some(Filter::gt("age", 30))).await.unwrap(), 2);
        assert_eq!(store.count_documents("Missing", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn find_sorts_and_paginates() {
        let (store, _) = seeded().await;

        let query = Query::builder()
            .sort("age", SortDirection::Desc)
            .offset(1)
            .limit(1)
            .build();
        let documents = store.find_documents(USERS, query).await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].get_str("name").unwrap(), "Ada");
    }

    #[tokio::test]
    async fn sort_handles_missing_and_mixed_fields() {
        let store = InMemoryStore::new();

        for index in 0..60_i32 {
            let document = match index % 4 {
                0 => doc! { "label": index },
                1 => doc! { "rank": format!("r{index:02}") },
                _ => doc! { "rank": 60 - index },
            };
            store.insert_document(USERS, ObjectId::new(), document).await.unwrap();
        }
        store.insert_document(USERS, ObjectId::new(), doc! { "rank": Bson::Null }).await.unwrap();

        let query = Query::builder().sort("rank", SortDirection::Asc).build();
        let documents = store.find_documents(USERS, query).await.unwrap();
        assert_eq!(documents.len(), 61);

        let ranks = documents
            .iter()
            .map(|document| document.get("rank").cloned().unwrap_or(Bson::Null))
            .collect::<Vec<_>>();
        let (nulls, rest) = ranks.split_at(16);
        assert!(nulls.iter().all(|rank| *rank == Bson::Null));

        let (numbers, strings) = rest.split_at(30);
        let numbers = numbers.iter().map(|rank| rank.as_i32().unwrap()).collect::<Vec<_>>();
        assert!(numbers.windows(2).all(|pair| pair[0] <= pair[1]));

        let strings = strings.iter().map(|rank| rank.as_str().unwrap()).collect::<Vec<_>>();
        assert_eq!(strings.len(), 15);
        assert!(strings.windows(2).all(|pair| pair[0] <= pair[1]));

        let query = Query::builder().sort("rank", SortDirection::Desc).limit(1).build();
        let top = store.find_documents(USERS, query).await.unwrap();
        assert_eq!(top[0].get_str("rank").unwrap(), "r57");
    }

    #[tokio::test]
    async fn zero_limit_returns_everything() {
        let (store, _) = seeded().await;

        let documents = store
            .find_documents(USERS, Query::builder().limit(0).build())
            .await
            .unwrap();

        assert_eq!(documents.len(), 3);
    }

    #[tokio::test]
    async fn collections_are_listed_and_dropped() {
        let (store, _) = seeded().await;
        store.insert_document("Order", ObjectId::new(), doc! {}).await.unwrap();

        assert_eq!(store.list_collections().await.unwrap(), vec!["Order", "User"]);

        store.drop_collection(USERS).await.unwrap();
        store.drop_collection(USERS).await.unwrap();
        assert_eq!(store.list_collections().await.unwrap(), vec!["Order"]);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = InMemoryStore::builder().build().await.unwrap();
        let clone = store.clone();

        clone.insert_document(USERS, ObjectId::new(), doc! {}).await.unwrap();

        assert_eq!(store.count_documents(USERS, None).await.unwrap(), 1);
    }
}
